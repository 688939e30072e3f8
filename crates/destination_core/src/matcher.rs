use regex::Regex;
use serde::Deserialize;
use store_logging::{store_error, store_warn};

use crate::{Destination, Origin, PrinterType};

const LOCAL_ORIGINS: [Origin; 4] = [Origin::Local, Origin::Privet, Origin::Extension, Origin::Cros];

/// Predicate deciding which destination should be selected automatically.
#[derive(Debug, Clone)]
pub struct DestinationMatch {
    origins: Vec<Origin>,
    id_pattern: Option<Regex>,
    name_pattern: Option<Regex>,
    skip_virtual: bool,
}

/// Serialized default destination selection rules.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionRules {
    kind: Option<String>,
    id_pattern: Option<String>,
    name_pattern: Option<String>,
}

impl DestinationMatch {
    pub fn new(
        origins: Vec<Origin>,
        id_pattern: Option<Regex>,
        name_pattern: Option<Regex>,
        skip_virtual: bool,
    ) -> Self {
        Self {
            origins,
            id_pattern,
            name_pattern,
            skip_virtual,
        }
    }

    /// Matches exactly one destination id within one origin.
    pub fn exact(origin: Origin, id: &str) -> Self {
        let pattern = format!("^{}$", regex::escape(id));
        // An escaped literal always compiles.
        let id_pattern = Regex::new(&pattern).ok();
        Self::new(vec![origin], id_pattern, None, false)
    }

    /// Parses the serialized selection rules policy.
    ///
    /// Returns `None` for an empty, malformed or unsupported configuration.
    /// A pattern that fails to compile is dropped, the rest of the rule stays.
    pub fn from_rules_json(serialized: &str) -> Option<Self> {
        if serialized.trim().is_empty() {
            return None;
        }
        let value: serde_json::Value = match serde_json::from_str(serialized) {
            Ok(value) => value,
            Err(err) => {
                store_error!("Failed to parse default destination selection rules: {}", err);
                return None;
            }
        };
        if value.is_null() {
            return None;
        }
        let rules: SelectionRules = match serde_json::from_value(value) {
            Ok(rules) => rules,
            Err(err) => {
                store_error!("Unsupported default destination selection rules: {}", err);
                return None;
            }
        };

        let kind = rules.kind.as_deref().filter(|kind| !kind.is_empty());
        let is_local = matches!(kind, None | Some("local"));
        let is_cloud = matches!(kind, None | Some("cloud"));
        if !is_local && !is_cloud {
            store_error!("Unsupported type: \"{}\"", kind.unwrap_or_default());
            return None;
        }

        let mut origins = Vec::new();
        if is_local {
            origins.extend(LOCAL_ORIGINS);
        }
        if is_cloud {
            origins.extend(Origin::CLOUD);
        }

        let id_pattern = compile_pattern("id", rules.id_pattern.as_deref());
        let name_pattern = compile_pattern("name", rules.name_pattern.as_deref());
        Some(Self::new(origins, id_pattern, name_pattern, true))
    }

    pub fn matches(&self, destination: &Destination) -> bool {
        if !self.matches_origin(destination.origin) {
            return false;
        }
        if let Some(pattern) = &self.id_pattern {
            if !pattern.is_match(&destination.id) {
                return false;
            }
        }
        if let Some(pattern) = &self.name_pattern {
            if !pattern.is_match(&destination.display_name) {
                return false;
            }
        }
        !(self.skip_virtual && (destination.is_virtual() || destination.is_provisional()))
    }

    /// Narrow check used for fetch outcomes: ignores the display name.
    pub fn matches_id_and_origin(&self, id: &str, origin: Origin) -> bool {
        self.matches_origin(origin)
            && self
                .id_pattern
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(id))
    }

    pub fn matches_origin(&self, origin: Origin) -> bool {
        self.origins.contains(&origin)
    }

    /// Distinct printer types that need searching for this rule, in origin order.
    pub fn printer_types(&self) -> Vec<PrinterType> {
        let mut types = Vec::new();
        for origin in &self.origins {
            let printer_type = origin.printer_type();
            if !types.contains(&printer_type) {
                types.push(printer_type);
            }
        }
        types
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }
}

impl PartialEq for DestinationMatch {
    fn eq(&self, other: &Self) -> bool {
        fn source(pattern: &Option<Regex>) -> Option<&str> {
            pattern.as_ref().map(Regex::as_str)
        }
        self.origins == other.origins
            && source(&self.id_pattern) == source(&other.id_pattern)
            && source(&self.name_pattern) == source(&other.name_pattern)
            && self.skip_virtual == other.skip_virtual
    }
}

fn compile_pattern(field: &str, pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern.filter(|p| !p.is_empty())?;
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            store_warn!("Failed to parse regexp for \"{}\": {}", field, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_escapes_the_id() {
        let rule = DestinationMatch::exact(Origin::Local, "HP.Laser (2)");
        assert!(rule.matches_id_and_origin("HP.Laser (2)", Origin::Local));
        assert!(!rule.matches_id_and_origin("HPxLaser (2)", Origin::Local));
        assert!(!rule.matches_id_and_origin("HP.Laser (2) copy", Origin::Local));
        assert!(!rule.matches_id_and_origin("HP.Laser (2)", Origin::Cros));
    }

    #[test]
    fn kind_selects_origin_groups() {
        let local = DestinationMatch::from_rules_json(r#"{"kind":"local"}"#).unwrap();
        assert_eq!(local.origins(), &LOCAL_ORIGINS);
        assert_eq!(
            local.printer_types(),
            vec![PrinterType::Local, PrinterType::Privet, PrinterType::Extension]
        );

        let cloud = DestinationMatch::from_rules_json(r#"{"kind":"cloud"}"#).unwrap();
        assert_eq!(cloud.printer_types(), vec![PrinterType::Cloud]);

        let both = DestinationMatch::from_rules_json("{}").unwrap();
        assert_eq!(both.origins().len(), 7);
    }

    #[test]
    fn malformed_configuration_is_no_rule() {
        assert!(DestinationMatch::from_rules_json("").is_none());
        assert!(DestinationMatch::from_rules_json("null").is_none());
        assert!(DestinationMatch::from_rules_json("{kind:").is_none());
        assert!(DestinationMatch::from_rules_json(r#"{"kind":"printer"}"#).is_none());
    }

    #[test]
    fn bad_pattern_is_dropped_but_rule_survives() {
        let rule =
            DestinationMatch::from_rules_json(r#"{"kind":"local","idPattern":"(unclosed"}"#)
                .unwrap();
        assert!(rule.matches(&Destination::new("anything", Origin::Local, "Any")));
    }

    #[test]
    fn rule_skips_virtual_and_provisional_destinations() {
        let rule = DestinationMatch::from_rules_json(r#"{"kind":"local"}"#).unwrap();
        assert!(!rule.matches(&Destination::save_as_pdf("Save as PDF")));
        let provisional = Destination::new("usb", Origin::Extension, "USB")
            .with_provisional(crate::ProvisionalType::NeedsUsbPermission);
        assert!(!rule.matches(&provisional));
    }

    #[test]
    fn name_pattern_applies_to_display_name() {
        let rule =
            DestinationMatch::from_rules_json(r#"{"namePattern":"^Office"}"#).unwrap();
        assert!(rule.matches(&Destination::new("p1", Origin::Local, "Office Laser")));
        assert!(!rule.matches(&Destination::new("Office", Origin::Local, "Lobby")));
        assert!(rule.matches_id_and_origin("Office", Origin::Local));
    }
}
