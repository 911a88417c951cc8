use crate::error::{Result, WheelError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Labels already stored in deployed databases, in wheel order.
pub const DEFAULT_PRIZES: [&str; 3] = [
    "Скидка 5 процентов",
    "Скидка 3 процентов",
    "Скидка 7 процентов",
];

/// Ordered prize labels. Clients address prizes by index, so order matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeCatalog {
    prizes: Vec<String>,
}

impl PrizeCatalog {
    pub fn new<I, S>(prizes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prizes: Vec<String> = prizes.into_iter().map(Into::into).collect();

        if prizes.is_empty() {
            return Err(WheelError::config("Prize catalog cannot be empty"));
        }
        if let Some(idx) = prizes.iter().position(|p| p.trim().is_empty()) {
            return Err(WheelError::config(format!(
                "Prize at index {} has an empty label",
                idx
            )));
        }

        Ok(Self { prizes })
    }

    pub fn prizes(&self) -> &[String] {
        &self.prizes
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.prizes.get(index).map(String::as_str)
    }

    pub fn index_of(&self, prize: &str) -> Option<usize> {
        self.prizes.iter().position(|p| p == prize)
    }
}

impl Default for PrizeCatalog {
    fn default() -> Self {
        Self {
            prizes: DEFAULT_PRIZES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Draws prizes uniformly, with replacement, from a catalog.
#[derive(Debug)]
pub struct PrizeAssigner<R> {
    catalog: PrizeCatalog,
    rng: R,
}

impl PrizeAssigner<StdRng> {
    pub fn from_entropy(catalog: PrizeCatalog) -> Self {
        Self::new(catalog, StdRng::from_entropy())
    }
}

impl<R: Rng> PrizeAssigner<R> {
    pub fn new(catalog: PrizeCatalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    pub fn assign(&mut self) -> &str {
        // catalog is never empty
        let idx = self.rng.gen_range(0..self.catalog.len());
        &self.catalog.prizes[idx]
    }
}
