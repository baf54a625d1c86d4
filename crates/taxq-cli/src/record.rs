//! Taxonomy records returned by queries

use serde::{Serialize, Serializer};
use std::fmt::Display;
use taxq_ingest::{GeneticCodeId, Node, TaxId};

use crate::lineage::Lineage;

/// One resolved taxon
///
/// Serializes with camelCase keys. Ids, codes and flags are written as
/// strings ("9606", "true").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyRecord {
    #[serde(serialize_with = "display_string")]
    pub taxid: TaxId,
    pub scientific_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// True when the common name is the GenBank common name
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "optional_display_string")]
    pub formal_name: Option<bool>,
    pub rank: String,
    pub division: String,
    pub lineage: String,
    #[serde(serialize_with = "display_string")]
    pub genetic_code: GeneticCodeId,
    #[serde(serialize_with = "display_string")]
    pub mitochondrial_genetic_code: GeneticCodeId,
    #[serde(serialize_with = "display_string")]
    pub submittable: bool,
}

impl TaxonomyRecord {
    pub fn from_node(node: &Node, lineage: &Lineage) -> Self {
        let (common_name, formal_name) = match node.common_name() {
            Some((name, formal)) => (Some(name.to_string()), Some(formal)),
            None => (None, None),
        };

        Self {
            taxid: node.taxid,
            scientific_name: node.scientific_name().unwrap_or_default().to_string(),
            common_name,
            formal_name,
            rank: node.rank.clone(),
            division: node.division.clone(),
            lineage: lineage.to_string(),
            genetic_code: node.genetic_code,
            mitochondrial_genetic_code: node.mitochondrial_genetic_code,
            submittable: node.is_species(),
        }
    }

    /// Key-value pairs in display order, keyed like the JSON form
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("taxid", self.taxid.to_string()),
            ("scientificName", self.scientific_name.clone()),
        ];
        if let Some(ref common) = self.common_name {
            fields.push(("commonName", common.clone()));
        }
        if let Some(formal) = self.formal_name {
            fields.push(("formalName", formal.to_string()));
        }
        fields.extend([
            ("rank", self.rank.clone()),
            ("division", self.division.clone()),
            ("lineage", self.lineage.clone()),
            ("geneticCode", self.genetic_code.to_string()),
            ("mitochondrialGeneticCode", self.mitochondrial_genetic_code.to_string()),
            ("submittable", self.submittable.to_string()),
        ]);
        fields
    }
}

fn display_string<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn optional_display_string<T: Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> TaxonomyRecord {
        TaxonomyRecord {
            taxid: 9606,
            scientific_name: "Homo sapiens".to_string(),
            common_name: Some("human".to_string()),
            formal_name: Some(true),
            rank: "species".to_string(),
            division: "PRI".to_string(),
            lineage: "Homo; Homo sapiens".to_string(),
            genetic_code: 1,
            mitochondrial_genetic_code: 2,
            submittable: true,
        }
    }

    #[test]
    fn test_json_uses_string_values() {
        let value = serde_json::to_value(record()).unwrap();

        assert_eq!(
            value,
            json!({
                "taxid": "9606",
                "scientificName": "Homo sapiens",
                "commonName": "human",
                "formalName": "true",
                "rank": "species",
                "division": "PRI",
                "lineage": "Homo; Homo sapiens",
                "geneticCode": "1",
                "mitochondrialGeneticCode": "2",
                "submittable": "true"
            })
        );
    }

    #[test]
    fn test_json_omits_missing_common_name() {
        let mut record = record();
        record.common_name = None;
        record.formal_name = None;

        let value = serde_json::to_value(record).unwrap();
        assert!(value.get("commonName").is_none());
        assert!(value.get("formalName").is_none());
    }

    #[test]
    fn test_fields_order() {
        let keys: Vec<_> = record().fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys.first(), Some(&"taxid"));
        assert_eq!(keys.last(), Some(&"submittable"));
        assert_eq!(keys.len(), 10);
    }
}
