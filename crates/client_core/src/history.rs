use std::fmt;

/// Append-only SAN plies, mirroring the authoritative sequence of applied moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    plies: Vec<String>,
}

impl MoveHistory {
    pub(crate) fn push(&mut self, san: impl Into<String>) {
        self.plies.push(san.into());
    }

    pub fn plies(&self) -> &[String] {
        &self.plies
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.plies.last().map(String::as_str)
    }

    /// White/black pairs, one per full move.
    pub fn pairs(&self) -> Vec<MovePair> {
        self.plies
            .chunks(2)
            .enumerate()
            .map(|(index, chunk)| MovePair {
                number: index + 1,
                white: chunk[0].clone(),
                black: chunk.get(1).cloned(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePair {
    pub number: usize,
    pub white: String,
    pub black: Option<String>,
}

impl fmt::Display for MovePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number, self.white)?;
        if let Some(black) = &self.black {
            write!(f, " {black}")?;
        }
        Ok(())
    }
}
