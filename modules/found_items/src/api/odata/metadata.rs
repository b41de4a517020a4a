//! CSDL (EDMX 4.0) description of the `FoundItems` entity set.

use std::fmt::Write;

pub const NAMESPACE: &str = "ZgubaGov";
pub const ENTITY_TYPE: &str = "FoundItem";
pub const ENTITY_SET: &str = "FoundItems";

/// `(property, EDM type, nullable)` in record order.
pub const PROPERTIES: [(&str, &str, bool); 17] = [
    ("id", "Edm.String", false),
    ("municipality_name", "Edm.String", true),
    ("municipality_type", "Edm.String", true),
    ("municipality_email", "Edm.String", true),
    ("item_name", "Edm.String", true),
    ("item_category", "Edm.String", true),
    ("item_date", "Edm.String", true),
    ("item_location", "Edm.String", true),
    ("item_status", "Edm.String", true),
    ("item_description", "Edm.String", true),
    ("pickup_deadline", "Edm.Int32", true),
    ("pickup_location", "Edm.String", true),
    ("pickup_hours", "Edm.String", true),
    ("pickup_contact", "Edm.String", true),
    ("categories", "Collection(Edm.String)", true),
    ("created_at", "Edm.DateTimeOffset", true),
    ("updated_at", "Edm.DateTimeOffset", true),
];

pub fn metadata_xml() -> String {
    let mut props = String::new();
    for (name, ty, nullable) in PROPERTIES {
        let _ = write!(props, "\n        <Property Name=\"{name}\" Type=\"{ty}\"");
        if !nullable {
            props.push_str(" Nullable=\"false\"");
        }
        props.push_str("/>");
    }

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="{NAMESPACE}" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="{ENTITY_TYPE}">
        <Key><PropertyRef Name="id"/></Key>{props}
      </EntityType>
      <EntityContainer Name="Default">
        <EntitySet Name="{ENTITY_SET}" EntityType="{NAMESPACE}.{ENTITY_TYPE}"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#
    )
}
