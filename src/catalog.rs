use anyhow::{Result, bail};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u32,
    pub title: Option<&'static str>,
}

const BUILTIN: &[(u32, &str)] = &[
    (9253, "Steins;Gate"),
    (101348, "Vinland Saga"),
    (20661, "Terror in Resonance"),
    (30, "Neon Genesis Evangelion"),
    (19, "Monster"),
    (1535, "Death Note"),
    (154587, "Frieren"),
    (21234, "Erased"),
    (185407, "Takopi's Original Sin"),
    (21827, "Violet Evergarden"),
];

/// Fixed, non-empty list of anime ids the resolver picks from.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|&(id, title)| CatalogEntry {
                    id,
                    title: Some(title),
                })
                .collect(),
        }
    }

    /// Builds a catalog from raw ids. Ids that also appear in the built-in
    /// catalog keep their known title.
    pub fn from_ids(ids: &[u32]) -> Result<Self> {
        if ids.is_empty() {
            bail!("catalog must contain at least one id");
        }
        let entries = ids
            .iter()
            .map(|&id| CatalogEntry {
                id,
                title: builtin_title(id),
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &CatalogEntry {
        let idx = rng.random_range(0..self.entries.len());
        &self.entries[idx]
    }
}

fn builtin_title(id: u32) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(known, _)| *known == id)
        .map(|&(_, title)| title)
}
