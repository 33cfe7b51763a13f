// Bell set and nearest-bell pitch mapping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One bell as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bell {
    pub name: String,
    pub pitch_class: u8,
}

/// Pitch classes the bells can sound, with their names.
///
/// Serialized as a list of [`Bell`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Bell>", into = "Vec<Bell>")]
pub struct BellMap {
    bells: BTreeMap<u8, String>,
}

impl From<Vec<Bell>> for BellMap {
    fn from(bells: Vec<Bell>) -> Self {
        Self::new(bells.iter().map(|b| (b.pitch_class, b.name.as_str())))
    }
}

impl From<BellMap> for Vec<Bell> {
    fn from(map: BellMap) -> Self {
        map.bells
            .into_iter()
            .map(|(pitch_class, name)| Bell { name, pitch_class })
            .collect()
    }
}

impl Default for BellMap {
    /// Do, Ré, Mi, Fa, Sol on C, D, E, F, G
    fn default() -> Self {
        Self::new([(0, "Do"), (2, "Ré"), (4, "Mi"), (5, "Fa"), (7, "Sol")])
    }
}

impl BellMap {
    /// Pitch classes are reduced modulo 12; a later entry for the same class wins.
    pub fn new<'a>(bells: impl IntoIterator<Item = (u8, &'a str)>) -> Self {
        Self {
            bells: bells
                .into_iter()
                .map(|(pc, name)| (pc % 12, name.to_string()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bells.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bells.values().map(String::as_str)
    }

    pub fn pitch_class_of(&self, name: &str) -> Option<u8> {
        self.bells.iter().find(|(_, n)| n.as_str() == name).map(|(&pc, _)| pc)
    }

    /// Allowed pitch class closest to `pitch`.
    ///
    /// Classes at or below the lowest allowed class map to it, classes at or
    /// above the highest map to that one; anything in between goes to the
    /// circularly nearest class, the lowest winning ties.
    pub fn nearest_pitch_class(&self, pitch: u8) -> Option<u8> {
        let lowest = *self.bells.keys().next()?;
        let highest = *self.bells.keys().next_back()?;
        let pc = pitch % 12;

        if pc <= lowest {
            return Some(lowest);
        }
        if pc >= highest {
            return Some(highest);
        }

        let mut best = lowest;
        let mut best_dist = u8::MAX;
        for &allowed in self.bells.keys() {
            let dist = circular_distance(pc, allowed);
            if dist < best_dist {
                best_dist = dist;
                best = allowed;
            }
        }
        Some(best)
    }

    /// Name of the bell nearest to `pitch`
    pub fn nearest_bell(&self, pitch: u8) -> Option<&str> {
        let pc = self.nearest_pitch_class(pitch)?;
        self.bells.get(&pc).map(String::as_str)
    }
}

fn circular_distance(a: u8, b: u8) -> u8 {
    let up = (a + 12 - b) % 12;
    let down = (b + 12 - a) % 12;
    up.min(down)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_pitch_class() {
        let bells = BellMap::default();
        let expected = [
            "Do", "Do", "Ré", "Ré", "Mi", "Fa", "Fa", "Sol", "Sol", "Sol", "Sol", "Sol",
        ];
        for (pc, name) in expected.iter().enumerate() {
            assert_eq!(bells.nearest_bell(60 + pc as u8), Some(*name), "pitch class {}", pc);
        }
    }

    #[test]
    fn interior_classes_use_circular_nearest() {
        let bells = BellMap::default();
        // C#: equidistant from C and D, first in order wins
        assert_eq!(bells.nearest_pitch_class(1), Some(0));
        // D#: equidistant from D and E
        assert_eq!(bells.nearest_pitch_class(3), Some(2));
        // F#: equidistant from F and G
        assert_eq!(bells.nearest_pitch_class(6), Some(5));
    }

    #[test]
    fn custom_bell_set() {
        let bells = BellMap::new([(14, "Ré"), (9, "La")]);
        assert_eq!(bells.pitch_class_of("Ré"), Some(2));
        assert_eq!(bells.nearest_bell(0), Some("Ré"));
        assert_eq!(bells.nearest_bell(11), Some("La"));
        assert_eq!(bells.nearest_bell(5), Some("Ré"));
        assert_eq!(bells.nearest_bell(7), Some("La"));
        assert_eq!(bells.names().collect::<Vec<_>>(), vec!["Ré", "La"]);
    }

    #[test]
    fn empty_map_has_no_bells() {
        let bells = BellMap::new(Vec::<(u8, &str)>::new());
        assert!(bells.is_empty());
        assert_eq!(bells.nearest_bell(60), None);
    }

    #[test]
    fn reads_bell_list_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            bells: BellMap,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[bells]]
            name = "Do"
            pitch_class = 0

            [[bells]]
            name = "Sol"
            pitch_class = 19
            "#,
        )
        .unwrap();
        assert_eq!(parsed.bells, BellMap::new([(0, "Do"), (7, "Sol")]));
    }
}
