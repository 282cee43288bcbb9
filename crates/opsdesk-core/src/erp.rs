//! ERP systems the text assistant can scope a question to.

/// One supported ERP integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Erp {
    pub name: &'static str,
    pub description: &'static str,
    pub quick_questions: [&'static str; 4],
}

/// Built-in catalog, in display order.
pub static CATALOG: &[Erp] = &[
    Erp {
        name: "QuickBooks Online",
        description: "Cloud-based accounting for small-to-mid-size field service businesses. Widely used BuildOps integration.",
        quick_questions: [
            "How do I set up the QBO integration?",
            "How does invoice sync work?",
            "How is job costing handled?",
            "Why isn't my customer syncing?",
        ],
    },
    Erp {
        name: "QuickBooks Desktop (Pro / Premier / Enterprise)",
        description: "On-premise QuickBooks via Web Connector or IIF export. Setup differs from QBO.",
        quick_questions: [
            "How does QBD sync differ from QBO?",
            "What is the Web Connector setup?",
            "How do I export invoices to QBD?",
            "What are the sync limitations?",
        ],
    },
    Erp {
        name: "Xero",
        description: "Cloud accounting popular with smaller contractors and service businesses.",
        quick_questions: [
            "How do I connect BuildOps to Xero?",
            "How do invoices sync to Xero?",
            "How are contacts mapped?",
            "Does Xero support job costing?",
        ],
    },
    Erp {
        name: "Sage Intacct",
        description: "Enterprise cloud ERP with strong job cost and project accounting features.",
        quick_questions: [
            "How is job costing set up in Intacct?",
            "How do dimensions map from BuildOps?",
            "How does invoice sync work?",
            "What GL accounts do I need to configure?",
        ],
    },
    Erp {
        name: "NetSuite (Oracle)",
        description: "Enterprise ERP with robust financials and project management. Common in larger BuildOps customers.",
        quick_questions: [
            "How does the NetSuite integration work?",
            "How are work orders mapped to NetSuite jobs?",
            "How do invoices sync to NetSuite?",
            "What are the prerequisites?",
        ],
    },
    Erp {
        name: "Microsoft Dynamics 365 Business Central",
        description: "Microsoft's cloud ERP for mid-market businesses, often used alongside Microsoft 365.",
        quick_questions: [
            "How do I set up the Business Central integration?",
            "How do customers sync?",
            "How are invoices pushed to BC?",
            "What fields are mapped?",
        ],
    },
    Erp {
        name: "Acumatica",
        description: "Cloud ERP popular with construction and field service companies for project and job cost accounting.",
        quick_questions: [
            "How does the Acumatica integration work?",
            "How is job cost data synced?",
            "How do service orders map to Acumatica?",
            "What are the configuration steps?",
        ],
    },
    Erp {
        name: "Sage 100 Contractor",
        description: "On-premise ERP designed for contractors, with job costing and project management built in.",
        quick_questions: [
            "How does BuildOps connect to Sage 100 Contractor?",
            "How is job cost data pushed?",
            "What sync methods are available?",
            "What are the known limitations?",
        ],
    },
    Erp {
        name: "Sage 300 CRE (Timberline)",
        description: "On-premise ERP for mid-to-large construction companies with deep job cost accounting.",
        quick_questions: [
            "How does the Sage 300 CRE integration work?",
            "How is job cost data exported?",
            "How do customers sync?",
            "What fields are supported?",
        ],
    },
    Erp {
        name: "Foundation Software",
        description: "Accounting and job cost software purpose-built for construction contractors.",
        quick_questions: [
            "How does BuildOps integrate with Foundation?",
            "How is job costing handled?",
            "How do invoices sync?",
            "What are the setup steps?",
        ],
    },
    Erp {
        name: "Spectrum (Viewpoint)",
        description: "ERP for construction companies with strong project management and job cost modules.",
        quick_questions: [
            "How does the Spectrum integration work?",
            "How are service orders mapped?",
            "How does job cost sync?",
            "What are the prerequisites?",
        ],
    },
    Erp {
        name: "ComputerEase",
        description: "Accounting software for construction contractors, common in mechanical and electrical trades.",
        quick_questions: [
            "How does BuildOps integrate with ComputerEase?",
            "How do invoices sync?",
            "How is job costing handled?",
            "What are known limitations?",
        ],
    },
    Erp {
        name: "Procore Financials",
        description: "Financial module within the Procore construction management platform.",
        quick_questions: [
            "How does BuildOps work with Procore Financials?",
            "How do contracts sync?",
            "How are invoices pushed?",
            "What fields are supported?",
        ],
    },
    Erp {
        name: "Viewpoint Vista",
        description: "Enterprise ERP for large construction companies, part of the Trimble portfolio.",
        quick_questions: [
            "How does the Vista integration work?",
            "How is job cost data handled?",
            "How do customers sync?",
            "What are the setup requirements?",
        ],
    },
    Erp {
        name: "Jonas Construction Software",
        description: "ERP designed for mechanical, electrical, plumbing, and HVAC contractors.",
        quick_questions: [
            "How does BuildOps integrate with Jonas?",
            "How are invoices synced?",
            "How is job costing supported?",
            "What are the current limitations?",
        ],
    },
];

/// Look up an ERP by name.
///
/// Exact (case-insensitive) names win; otherwise a case-insensitive
/// substring that matches exactly one entry is accepted, so `netsuite`
/// finds `NetSuite (Oracle)`.
pub fn find(name: &str) -> Option<&'static Erp> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(erp) = CATALOG.iter().find(|erp| erp.name.to_lowercase() == needle) {
        return Some(erp);
    }
    let mut matches = CATALOG
        .iter()
        .filter(|erp| erp.name.to_lowercase().contains(&needle));
    match (matches.next(), matches.next()) {
        (Some(erp), None) => Some(erp),
        _ => None,
    }
}

/// Wrap a question with the ERP context the chat service needs.
pub fn contextual_question(company: &str, erp: &str, question: &str) -> String {
    format!(
        "I am a {company} employee asking about the {company} integration with {erp}.\n\n\
         Question: {question}"
    )
}

/// The ERP an assistant is currently scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpTopic {
    pub company: String,
    pub erp: String,
}

impl ErpTopic {
    pub fn new(company: impl Into<String>, erp: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            erp: erp.into(),
        }
    }

    pub fn question(&self, question: &str) -> String {
        contextual_question(&self.company, &self.erp, question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_fifteen_entries_with_four_questions() {
        assert_eq!(CATALOG.len(), 15);
        assert!(CATALOG.iter().all(|erp| erp.quick_questions.iter().all(|q| !q.is_empty())));
    }

    #[test]
    fn test_find_exact_and_substring() {
        assert_eq!(find("xero").map(|e| e.name), Some("Xero"));
        assert_eq!(find("netsuite").map(|e| e.name), Some("NetSuite (Oracle)"));
        assert_eq!(find("Jonas").map(|e| e.name), Some("Jonas Construction Software"));
    }

    #[test]
    fn test_find_rejects_ambiguous_and_unknown() {
        // Matches both QuickBooks entries.
        assert!(find("quickbooks").is_none());
        assert!(find("SAP").is_none());
        assert!(find("  ").is_none());
    }

    #[test]
    fn test_contextual_question() {
        let topic = ErpTopic::new("BuildOps", "Xero");
        assert_eq!(
            topic.question("How are contacts mapped?"),
            "I am a BuildOps employee asking about the BuildOps integration with Xero.\n\nQuestion: How are contacts mapped?"
        );
    }
}
