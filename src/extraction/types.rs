//! Output shape of the extraction pipeline and lenient record decoding

use crate::analysis::{Entity, Relation};
use serde_json::Value;

/// Entities and relations produced by one extraction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutput {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl PassOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Decode a raw pass body such as `{"entities": [...], "relations": [...]}`.
    ///
    /// Missing collections decode as empty. A collection that is present but
    /// not an array, and records without the required fields, are dropped
    /// and counted in the returned report.
    pub fn decode(body: &Value) -> (Self, DecodeReport) {
        let mut report = DecodeReport::default();
        let mut output = PassOutput::new();

        for record in collection(body, "entities", &mut report) {
            match decode_entity(record) {
                Some(entity) => output.entities.push(entity),
                None => report.rejected_entities += 1,
            }
        }

        for record in collection(body, "relations", &mut report) {
            match decode_relation(record) {
                Some(relation) => output.relations.push(relation),
                None => report.rejected_relations += 1,
            }
        }

        (output, report)
    }
}

fn collection<'a>(body: &'a Value, key: &str, report: &mut DecodeReport) -> &'a [Value] {
    match body.get(key) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(records)) => records.as_slice(),
        Some(_) => {
            report.malformed_collections += 1;
            &[]
        }
    }
}

/// Counts of records dropped while decoding a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub rejected_entities: usize,
    pub rejected_relations: usize,
    /// `entities` or `relations` keys holding something other than an array
    pub malformed_collections: usize,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.rejected_entities == 0
            && self.rejected_relations == 0
            && self.malformed_collections == 0
    }
}

fn decode_entity(record: &Value) -> Option<Entity> {
    Some(Entity::new(
        record.get("surface")?.as_str()?,
        record.get("concept")?.as_str()?,
    ))
}

fn decode_relation(record: &Value) -> Option<Relation> {
    let subject = decode_entity(record.get("subject")?)?;
    let argument = decode_entity(record.get("argument")?)?;
    let predicate = record.get("predicate")?.as_str()?;
    let context = record
        .get("context")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(Relation::new(subject, predicate, argument, context))
}

/// Everything one pipeline run produced, keyed by pass name in declaration order
///
/// A pass that produced nothing usable is kept as `None` so callers can tell
/// "ran but empty" from "absent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutput {
    passes: Vec<(String, Option<PassOutput>)>,
}

impl ExtractionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass(mut self, name: impl Into<String>, output: PassOutput) -> Self {
        self.push(name, Some(output));
        self
    }

    pub fn with_absent_pass(mut self, name: impl Into<String>) -> Self {
        self.push(name, None);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, output: Option<PassOutput>) {
        self.passes.push((name.into(), output));
    }

    /// Passes in declaration order
    pub fn passes(&self) -> impl Iterator<Item = (&str, Option<&PassOutput>)> {
        self.passes
            .iter()
            .map(|(name, output)| (name.as_str(), output.as_ref()))
    }

    pub fn pass(&self, name: &str) -> Option<&PassOutput> {
        self.passes
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, output)| output.as_ref())
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_keeps_well_formed_records() {
        let body = json!({
            "entities": [
                {"surface": "Mario", "concept": "Person"},
                {"concept": "Place", "surface": "Rome", "confidence": 0.7}
            ],
            "relations": [{
                "subject": {"surface": "Mario", "concept": "Person"},
                "predicate": "lives_in",
                "argument": {"surface": "Rome", "concept": "Place"},
                "context": "Mario lives in Rome."
            }]
        });

        let (output, report) = PassOutput::decode(&body);
        assert!(report.is_clean());
        assert_eq!(output.entities.len(), 2);
        assert_eq!(output.entities[1], Entity::new("Rome", "Place"));
        assert_eq!(output.relations[0].predicate, "lives_in");
    }

    #[test]
    fn decode_drops_malformed_records() {
        let body = json!({
            "entities": [
                {"surface": "Mario"},
                {"surface": "Rome", "concept": "Place"},
                "not an object"
            ],
            "relations": [
                {"subject": {"surface": "Mario", "concept": "Person"}, "predicate": "knows"},
                {
                    "subject": {"surface": "Mario", "concept": "Person"},
                    "predicate": "knows",
                    "argument": {"surface": "Luigi", "concept": "Person"}
                }
            ]
        });

        let (output, report) = PassOutput::decode(&body);
        assert_eq!(output.entities, vec![Entity::new("Rome", "Place")]);
        assert_eq!(output.relations.len(), 1);
        assert_eq!(output.relations[0].context, "");
        assert_eq!(report.rejected_entities, 2);
        assert_eq!(report.rejected_relations, 1);
    }

    #[test]
    fn decode_reports_collections_that_are_not_arrays() {
        let body = json!({
            "entities": {"surface": "Mario", "concept": "Person"},
            "relations": "none found"
        });

        let (output, report) = PassOutput::decode(&body);
        assert_eq!(output, PassOutput::new());
        assert_eq!(report.malformed_collections, 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn decode_tolerates_missing_collections() {
        let (output, report) = PassOutput::decode(&json!({"situations": []}));
        assert_eq!(output, PassOutput::new());
        assert!(report.is_clean());
    }

    #[test]
    fn output_preserves_declaration_order() {
        let output = ExtractionOutput::new()
            .with_pass("relations", PassOutput::new())
            .with_absent_pass("situations");

        let names: Vec<_> = output.passes().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["relations", "situations"]);
        assert!(output.pass("relations").is_some());
        assert!(output.pass("situations").is_none());
    }
}
