//! Worked question-to-descriptor examples shown to the model

use docent_domain::QueryDescriptor;

/// One worked example: a question and the descriptor that answers it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exemplar {
    /// Natural-language question
    pub question: &'static str,

    /// Descriptor JSON in wire form
    pub descriptor: &'static str,
}

impl Exemplar {
    /// Decode the descriptor JSON
    pub fn decode(&self) -> Result<QueryDescriptor, serde_json::Error> {
        serde_json::from_str(self.descriptor)
    }
}

/// The bundled exemplar set, in prompt order
pub fn exemplars() -> &'static [Exemplar] {
    EXEMPLARS
}

const EXEMPLARS: &[Exemplar] = &[
    Exemplar {
        question: "Who are founding partners for Rupp Pfalzgraf?",
        descriptor: r#"{
  "collection": "teams",
  "query": { "position": { "$regex": "Founding Partner", "$options": "i" } },
  "projection": { "name": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "How many team members are there in total for each firm?",
        descriptor: r#"{
  "collection": "teams",
  "query": {},
  "aggregation": [
    { "$group": { "_id": "$firm", "total_members": { "$sum": 1 } } }
  ]
}"#,
    },
    Exemplar {
        question: "Which members hold multiple titles or positions?",
        descriptor: r#"{
  "collection": "teams",
  "query": { "position": { "$regex": "," } },
  "projection": { "name": 1, "position": 1, "firm": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "Tell me about Tony Rupp's professional background.",
        descriptor: r#"{
  "collection": "teams",
  "query": { "name": "Tony Rupp" },
  "projection": { "about": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "Summarize David Pfalzgraf, Jr.'s experience.",
        descriptor: r#"{
  "collection": "teams",
  "query": { "name": "David Pfalzgraf, Jr." },
  "projection": { "achievements": 1, "admissions": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "What positions are currently available?",
        descriptor: r#"{
  "collection": "careers",
  "query": {},
  "projection": { "position": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "What are the unique firms represented in the data?",
        descriptor: r#"{
  "collection": "teams",
  "query": {},
  "aggregation": [
    { "$group": { "_id": null, "unique_firms": { "$addToSet": "$firm" } } }
  ]
}"#,
    },
    Exemplar {
        question: "What is Tony Rupp's educational background?",
        descriptor: r#"{
  "collection": "teams",
  "query": { "name": "Tony Rupp" },
  "projection": { "education": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "List the count partner team members by firm",
        descriptor: r#"{
  "collection": "teams",
  "query": { "position": { "$regex": "Partner", "$options": "i" } },
  "aggregation": [
    { "$match": { "position": { "$regex": "Partner", "$options": "i" } } },
    { "$group": { "_id": "$firm", "partner_count": { "$sum": 1 } } },
    { "$project": { "firm": "$_id", "_id": 0, "partner_count": 1 } }
  ]
}"#,
    },
    Exemplar {
        question: "how many members attended University at Buffalo School of Law from each firm?",
        descriptor: r#"{
  "collection": "teams",
  "aggregation": [
    { "$match": { "education": { "$regex": "University at Buffalo School of Law", "$options": "i" } } },
    { "$group": { "_id": "$firm", "count": { "$sum": 1 } } },
    { "$project": { "firm": "$_id", "_id": 0, "count": 1 } }
  ]
}"#,
    },
    Exemplar {
        question: "List all available positions in Buffalo, NY.",
        descriptor: r#"{
  "collection": "careers",
  "query": { "location": { "$regex": "Buffalo, NY", "$options": "i" } },
  "projection": { "position": 1, "location": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "How many positions are currently present from each city?",
        descriptor: r#"{
  "collection": "careers",
  "query": {},
  "aggregation": [
    { "$group": { "_id": "$location", "total_positions": { "$sum": 1 } } }
  ]
}"#,
    },
    Exemplar {
        question: "What are the positions that require 2-5 years of experience?",
        descriptor: r#"{
  "collection": "careers",
  "query": { "experience": "2-5 years" },
  "projection": { "position": 1, "experience": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "What is the contact phone number for Tony Rupp?",
        descriptor: r#"{
  "collection": "teams",
  "query": { "name": { "$regex": "Tony Rupp", "$options": "i" } },
  "projection": { "name": 1, "phone": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "What is the pay rate for paralegal roles in Buffalo?",
        descriptor: r#"{
  "collection": "careers",
  "query": {
    "position": { "$regex": "Paralegal", "$options": "i" },
    "location": "Buffalo, NY"
  },
  "projection": { "position": 1, "compensation": 1, "pay type": 1, "location": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "What is the compensation range for a Labor & Employment Associate?",
        descriptor: r#"{
  "collection": "careers",
  "query": { "position": { "$regex": "Labor & Employment Associate", "$options": "i" } },
  "projection": { "position": 1, "compensation": 1, "location": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "How many positions are available in each city?",
        descriptor: r#"{
  "collection": "careers",
  "query": {},
  "aggregation": [
    { "$group": { "_id": "$location", "total_positions": { "$sum": 1 } } },
    { "$project": { "city": "$_id", "_id": 0, "total_positions": 1 } }
  ]
}"#,
    },
    Exemplar {
        question: "Which articles focus on the Finance area?",
        descriptor: r#"{
  "collection": "articles",
  "query": { "area": "Finance" },
  "projection": { "title": 1, "area": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "List articles discussing succession planning.",
        descriptor: r#"{
  "collection": "articles",
  "query": { "body": { "$regex": "succession planning", "$options": "i" } },
  "projection": { "title": 1, "_id": 0 },
  "limit": 5
}"#,
    },
    Exemplar {
        question: "Are there any articles discussing the Construction industry?",
        descriptor: r#"{
  "collection": "articles",
  "query": { "body": { "$regex": "Construction", "$options": "i" } },
  "projection": { "title": 1, "_id": 0 },
  "limit": 5
}"#,
    },
    Exemplar {
        question: "What are the specializations under Business Law",
        descriptor: r#"{
  "collection": "practices",
  "query": { "title": "Business Law" },
  "projection": { "specializations": 1, "title": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "Show all team members in the Immigration Law practice.",
        descriptor: r#"{
  "collection": "practices",
  "query": { "title": "Immigration Law" },
  "projection": { "team members": 1, "firm": 1, "title": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "Who are the leaders in the Environmental Law practice?",
        descriptor: r#"{
  "collection": "practices",
  "query": { "title": "Environmental Law" },
  "projection": { "leaders": 1, "firm": 1, "title": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "Which practices involve regulatory compliance?",
        descriptor: r#"{
  "collection": "practices",
  "query": { "specializations": { "$elemMatch": { "$regex": "compliance", "$options": "i" } } },
  "projection": { "title": 1, "firm": 1, "_id": 0 }
}"#,
    },
    Exemplar {
        question: "List all members who work in Environmental Law.",
        descriptor: r#"{
  "collection": "practices",
  "query": { "title": "Environmental Law" },
  "projection": { "team members": 1, "firm": 1, "_id": 0 }
}"#,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use docent_domain::{QueryPlan, SchemaContract};
    use std::collections::HashSet;

    #[test]
    fn test_exemplar_count() {
        assert_eq!(exemplars().len(), 25);
    }

    #[test]
    fn test_every_exemplar_decodes() {
        for exemplar in exemplars() {
            let descriptor = exemplar
                .decode()
                .unwrap_or_else(|e| panic!("{:?} failed to decode: {}", exemplar.question, e));
            assert!(
                SchemaContract::standard().contains_collection(&descriptor.collection),
                "{:?} targets {}",
                exemplar.question,
                descriptor.collection
            );
        }
    }

    #[test]
    fn test_questions_are_unique() {
        let questions: HashSet<_> = exemplars().iter().map(|e| e.question).collect();
        assert_eq!(questions.len(), exemplars().len());
    }

    #[test]
    fn test_partner_count_exemplar_is_aggregation() {
        let exemplar = exemplars()
            .iter()
            .find(|e| e.question.starts_with("List the count partner"))
            .unwrap();
        let descriptor = exemplar.decode().unwrap();
        assert!(!descriptor.filter.is_empty());
        assert!(matches!(descriptor.plan(), QueryPlan::Aggregate { pipeline } if pipeline.len() == 3));
    }
}
