use cn_core::ScannerKind;

#[derive(Debug, Clone, Copy)]
pub struct ScannerMapping {
    pub scanner: ScannerKind,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Control {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_human_evidence: bool,
    pub scanner_mappings: &'static [ScannerMapping],
}

const fn m(scanner: ScannerKind, confidence: f64) -> ScannerMapping {
    ScannerMapping { scanner, confidence }
}

/// SOC2-lite: 20 controls spanning the Common Criteria, Availability,
/// Confidentiality, Processing Integrity, and Privacy trust service
/// categories.
pub static SOC2_LITE: &[Control] = &[
    Control {
        id: "CC6.1",
        name: "Logical access security measures",
        description: "Restricts logical access to information assets through authentication and authorization controls.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Gitleaks, 0.8), m(ScannerKind::Checkov, 0.4)],
    },
    Control {
        id: "CC6.3",
        name: "Access removal and role changes",
        description: "Removes access when no longer required and manages role-based access changes.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.3)],
    },
    Control {
        id: "CC6.6",
        name: "Protection against external threats",
        description: "Protects the boundary of the system against unauthorized access and external threats.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.7), m(ScannerKind::Gitleaks, 0.5)],
    },
    Control {
        id: "CC6.7",
        name: "Restriction of data transmission",
        description: "Restricts the transmission, movement, and removal of information to authorized users and processes.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.6)],
    },
    Control {
        id: "CC6.8",
        name: "Prevention of unauthorized software",
        description: "Prevents or detects the introduction of unauthorized or malicious software.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::NpmAudit, 0.7)],
    },
    Control {
        id: "CC7.1",
        name: "Vulnerability detection",
        description: "Detects and monitors for new vulnerabilities affecting the system's components.",
        requires_human_evidence: false,
        scanner_mappings: &[
            m(ScannerKind::NpmAudit, 0.9),
            m(ScannerKind::Checkov, 0.6),
            m(ScannerKind::Gitleaks, 0.6),
        ],
    },
    Control {
        id: "CC7.2",
        name: "Security event monitoring",
        description: "Monitors system components for anomalies indicative of a security event.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "CC7.3",
        name: "Security incident evaluation",
        description: "Evaluates security events to determine whether they represent a security incident.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "CC7.4",
        name: "Incident response",
        description: "Responds to identified security incidents by executing a defined incident response program.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "CC8.1",
        name: "Change management",
        description: "Authorizes, designs, develops, tests, and implements changes to infrastructure and software.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.3)],
    },
    Control {
        id: "CC9.1",
        name: "Risk mitigation",
        description: "Identifies, selects, and develops risk mitigation activities for vendor and business disruptions.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "A1.1",
        name: "Capacity planning",
        description: "Maintains, monitors, and evaluates current processing capacity and usage.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "A1.2",
        name: "Environmental and infrastructure resilience",
        description: "Designs infrastructure, data, software, and procedures for system recovery and resilience.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.7)],
    },
    Control {
        id: "C1.1",
        name: "Confidential information identification",
        description: "Identifies and maintains confidential information to meet the entity's objectives.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Gitleaks, 0.9)],
    },
    Control {
        id: "C1.2",
        name: "Confidential information disposal",
        description: "Disposes of confidential information to meet the entity's objectives.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "PI1.1",
        name: "Processing integrity definitions",
        description: "Obtains and uses information regarding objectives relevant to processing integrity.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "PI1.4",
        name: "Processing error detection",
        description: "Detects and corrects errors affecting the completeness and accuracy of processing.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::NpmAudit, 0.4)],
    },
    Control {
        id: "P1.1",
        name: "Privacy notice",
        description: "Provides notice of privacy practices to data subjects.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "P6.1",
        name: "Disclosure of personal information",
        description: "Discloses personal information only with consent or as required by applicable law.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Gitleaks, 0.6)],
    },
    Control {
        id: "P8.1",
        name: "Privacy incident inquiry",
        description: "Inquires, investigates, and remediates complaints related to the handling of personal information.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
];

/// HIPAA: 12 technical safeguards (45 CFR 164.312) scorable against
/// scanners, plus 7 administrative safeguards (164.308) that always
/// require human evidence and are excluded from the percentage.
pub static HIPAA: &[Control] = &[
    Control {
        id: "164.312(a)(1)",
        name: "Access control",
        description: "Implements technical policies and procedures for electronic information systems that maintain electronic protected health information to allow access only to authorized persons.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.6), m(ScannerKind::Gitleaks, 0.5)],
    },
    Control {
        id: "164.312(a)(2)(i)",
        name: "Unique user identification",
        description: "Assigns a unique name and/or number for identifying and tracking user identity.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.312(a)(2)(ii)",
        name: "Emergency access procedure",
        description: "Establishes procedures for obtaining necessary ePHI during an emergency.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.312(a)(2)(iv)",
        name: "Encryption and decryption",
        description: "Implements a mechanism to encrypt and decrypt electronic protected health information.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.9), m(ScannerKind::Gitleaks, 0.4)],
    },
    Control {
        id: "164.312(b)",
        name: "Audit controls",
        description: "Implements hardware, software, and procedural mechanisms that record and examine activity in systems containing ePHI.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.5)],
    },
    Control {
        id: "164.312(c)(1)",
        name: "Integrity",
        description: "Implements policies and procedures to protect ePHI from improper alteration or destruction.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.4)],
    },
    Control {
        id: "164.312(d)",
        name: "Person or entity authentication",
        description: "Verifies that a person or entity seeking access to ePHI is the one claimed.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.312(e)(1)",
        name: "Transmission security",
        description: "Implements technical security measures to guard against unauthorized access to ePHI transmitted over a network.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.8)],
    },
    Control {
        id: "164.312(e)(2)(i)",
        name: "Integrity controls (transmission)",
        description: "Implements security measures to ensure electronically transmitted ePHI is not improperly modified.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.5)],
    },
    Control {
        id: "164.312(e)(2)(ii)",
        name: "Encryption (transmission)",
        description: "Encrypts ePHI whenever deemed appropriate during transmission.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Checkov, 0.8), m(ScannerKind::Gitleaks, 0.5)],
    },
    Control {
        id: "164.312(a)(2)(iii)",
        name: "Automatic logoff",
        description: "Implements electronic procedures that terminate a session after a predetermined time of inactivity.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.312(c)(2)",
        name: "Mechanism to authenticate ePHI",
        description: "Implements electronic mechanisms to corroborate that ePHI has not been altered or destroyed in an unauthorized manner.",
        requires_human_evidence: false,
        scanner_mappings: &[m(ScannerKind::Gitleaks, 0.3), m(ScannerKind::Checkov, 0.3)],
    },
    // Administrative safeguards (164.308): always human-evidence, never
    // contribute to the percentage, but still reported so a reader sees the
    // full safeguard set.
    Control {
        id: "164.308(a)(1)",
        name: "Security management process",
        description: "Implements policies and procedures to prevent, detect, contain, and correct security violations.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(3)",
        name: "Workforce security",
        description: "Implements policies and procedures to ensure appropriate workforce access to ePHI.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(4)",
        name: "Information access management",
        description: "Implements policies and procedures for authorizing access to ePHI consistent with the privacy rule.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(5)",
        name: "Security awareness and training",
        description: "Implements a security awareness and training program for all workforce members.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(6)",
        name: "Security incident procedures",
        description: "Implements policies and procedures to address security incidents.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(7)",
        name: "Contingency plan",
        description: "Establishes policies and procedures for responding to an emergency or other occurrence that damages systems containing ePHI.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
    Control {
        id: "164.308(a)(8)",
        name: "Evaluation",
        description: "Performs a periodic technical and nontechnical evaluation of security safeguards.",
        requires_human_evidence: true,
        scanner_mappings: &[],
    },
];

pub fn controls_for(framework: cn_core::Framework) -> &'static [Control] {
    match framework {
        cn_core::Framework::Soc2 => SOC2_LITE,
        cn_core::Framework::Hipaa => HIPAA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soc2_lite_has_twenty_controls() {
        assert_eq!(SOC2_LITE.len(), 20);
    }

    #[test]
    fn hipaa_has_twelve_technical_and_seven_administrative() {
        let technical = HIPAA.iter().filter(|c| c.id.starts_with("164.312")).count();
        let administrative = HIPAA.iter().filter(|c| c.id.starts_with("164.308")).count();
        assert_eq!(technical, 12);
        assert_eq!(administrative, 7);
        assert!(HIPAA
            .iter()
            .filter(|c| c.id.starts_with("164.308"))
            .all(|c| c.requires_human_evidence));
    }

    #[test]
    fn control_ids_are_unique_within_each_framework() {
        for set in [SOC2_LITE, HIPAA] {
            let mut ids: Vec<&str> = set.iter().map(|c| c.id).collect();
            let before = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), before);
        }
    }
}
