//! Quell- und abgeleitete Records der Synchronisation.

use serde_json::Value;

use super::Polyline;

/// Attribut-Feld, unter dem die Quell-Record-ID im abgeleiteten Record
/// mitgeführt wird.
pub const LINE_OBJECT_ID_FIELD: &str = "_line_objectid";

/// Attribut-Payload eines Records (wird unverändert durchgereicht).
pub type AttributeMap = serde_json::Map<String, Value>;

/// Ein Record der Linien-Quelle.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    /// Stabile ID innerhalb der Quelle
    pub id: u64,
    /// Linien-Geometrie
    pub geometry: Polyline,
    /// Fachattribute (pass-through)
    pub attributes: AttributeMap,
}

impl LineRecord {
    /// Erstellt einen Quell-Record ohne Attribute.
    pub fn new(id: u64, geometry: Polyline) -> Self {
        Self {
            id,
            geometry,
            attributes: AttributeMap::new(),
        }
    }
}

/// Ein frisch berechneter, abgeleiteter Record.
///
/// Wird pro Refresh neu erzeugt; die zugehörige Derived-ID steht erst nach
/// der Reconciliation (Updates) bzw. nach dem Apply im Store (Adds) fest.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    /// ID des Quell-Records, aus dem dieser Record berechnet wurde
    pub source_id: u64,
    /// Abgeleitete Geometrie (Spline-Pfad oder Original-Durchreichung)
    pub geometry: Polyline,
    /// Übernommene Attribute inkl. [`LINE_OBJECT_ID_FIELD`]
    pub attributes: AttributeMap,
}

impl DerivedRecord {
    /// Erstellt einen abgeleiteten Record und trägt die Quell-ID in die
    /// Attribute ein.
    pub fn new(source_id: u64, geometry: Polyline, mut attributes: AttributeMap) -> Self {
        attributes.insert(LINE_OBJECT_ID_FIELD.to_string(), Value::from(source_id));
        Self {
            source_id,
            geometry,
            attributes,
        }
    }
}
