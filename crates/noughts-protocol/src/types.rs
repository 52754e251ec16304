//! Game vocabulary shared by the server and the wire format.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique token naming one game session (a whole series).
///
/// Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Board vocabulary
// ---------------------------------------------------------------------------

/// One of the two sides. X always opens a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => f.write_str("X"),
            Symbol::O => f.write_str("O"),
        }
    }
}

/// A board square. Empty squares travel as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    /// The symbol occupying this square, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Symbol::X),
            Cell::O => Some(Symbol::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl From<Symbol> for Cell {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::X => Cell::X,
            Symbol::O => Cell::O,
        }
    }
}

/// Result of a round or of a whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    X,
    O,
    #[serde(rename = "DRAW")]
    Draw,
}

impl RoundResult {
    /// The winning side, or `None` for a draw.
    pub fn winner(self) -> Option<Symbol> {
        match self {
            RoundResult::X => Some(Symbol::X),
            RoundResult::O => Some(Symbol::O),
            RoundResult::Draw => None,
        }
    }
}

impl From<Symbol> for RoundResult {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::X => RoundResult::X,
            Symbol::O => RoundResult::O,
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundResult::X => f.write_str("X"),
            RoundResult::O => f.write_str("O"),
            RoundResult::Draw => f.write_str("DRAW"),
        }
    }
}

/// Two humans, or a human against the built-in opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameMode {
    Pvp,
    Pve,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Pvp => f.write_str("PVP"),
            GameMode::Pve => f.write_str("PVE"),
        }
    }
}

/// Serializes `None` as `""` and reads `""` back as `None`.
///
/// Used for "no next player" and "no series winner yet".
pub(crate) mod blank {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Blank<T> {
            Value(T),
            Text(String),
        }

        match Blank::<T>::deserialize(deserializer)? {
            Blank::Value(v) => Ok(Some(v)),
            Blank::Text(s) if s.is_empty() => Ok(None),
            Blank::Text(s) => Err(D::Error::custom(format!("unexpected value {s:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_other_flips() {
        assert_eq!(Symbol::X.other(), Symbol::O);
        assert_eq!(Symbol::O.other(), Symbol::X);
    }

    #[test]
    fn test_cell_serializes_empty_as_blank_string() {
        let row = vec![Cell::Empty, Cell::X, Cell::O];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["","X","O"]"#);
    }

    #[test]
    fn test_round_result_draw_uses_upper_case() {
        assert_eq!(serde_json::to_string(&RoundResult::Draw).unwrap(), r#""DRAW""#);
        assert_eq!(RoundResult::from(Symbol::O), RoundResult::O);
        assert_eq!(RoundResult::Draw.winner(), None);
    }

    #[test]
    fn test_game_mode_wire_names() {
        assert_eq!(serde_json::to_string(&GameMode::Pve).unwrap(), r#""PVE""#);
        assert_eq!(GameMode::Pvp.to_string(), "PVP");
    }

    #[test]
    fn test_game_id_is_transparent() {
        let id = GameId("abc".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc""#);
    }
}
