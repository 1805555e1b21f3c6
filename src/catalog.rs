//! Attribute catalog: the fixed, ordered vocabulary of facial attributes.
//!
//! A catalog is a bijection between attribute names and indices `0..len`.
//! Sample vectors are laid out in catalog order, so every attribute access in
//! the crate is an index lookup through a catalog rather than a string key.
//!
//! ```rust
//! use mien::AttributeCatalog;
//!
//! let catalog = AttributeCatalog::celeba();
//! let idx = catalog.indices_of(&["Bangs", "Smiling"]).unwrap();
//! assert_eq!(idx, vec![5, 31]);
//! assert_eq!(catalog.names_of(&idx).unwrap(), vec!["Bangs", "Smiling"]);
//! ```

use crate::error::{Error, Result};
use std::collections::HashMap;

/// The 40 CelebA attributes in the order of `list_attr_celeba.csv`.
pub const CELEBA_ATTRIBUTES: [&str; 40] = [
    "5_o_Clock_Shadow",
    "Arched_Eyebrows",
    "Attractive",
    "Bags_Under_Eyes",
    "Bald",
    "Bangs",
    "Big_Lips",
    "Big_Nose",
    "Black_Hair",
    "Blond_Hair",
    "Blurry",
    "Brown_Hair",
    "Bushy_Eyebrows",
    "Chubby",
    "Double_Chin",
    "Eyeglasses",
    "Goatee",
    "Gray_Hair",
    "Heavy_Makeup",
    "High_Cheekbones",
    "Male",
    "Mouth_Slightly_Open",
    "Mustache",
    "Narrow_Eyes",
    "No_Beard",
    "Oval_Face",
    "Pale_Skin",
    "Pointy_Nose",
    "Receding_Hairline",
    "Rosy_Cheeks",
    "Sideburns",
    "Smiling",
    "Straight_Hair",
    "Wavy_Hair",
    "Wearing_Earrings",
    "Wearing_Hat",
    "Wearing_Lipstick",
    "Wearing_Necklace",
    "Wearing_Necktie",
    "Young",
];

/// Bidirectional mapping between attribute names and stable indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCatalog {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl AttributeCatalog {
    /// Build a catalog from an ordered list of unique names.
    pub fn build<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            if index.contains_key(&name) {
                return Err(Error::DuplicateAttribute(name));
            }
            let _ = index.insert(name.clone(), ordered.len());
            ordered.push(name);
        }
        Ok(Self {
            names: ordered,
            index,
        })
    }

    /// The full 40-attribute CelebA catalog.
    pub fn celeba() -> Self {
        let names = CELEBA_ATTRIBUTES.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// A new catalog with the given names removed; names not present are ignored.
    ///
    /// Remaining attributes keep their relative order but are re-indexed.
    pub fn without(&self, drop: &[&str]) -> Self {
        let names: Vec<String> = self
            .names
            .iter()
            .filter(|n| !drop.contains(&n.as_str()))
            .cloned()
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// A new catalog containing exactly `names`, in the order given.
    ///
    /// Fails if any name is unknown here or repeated.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let _ = self.indices_of(names)?;
        Self::build(names.iter().map(|s| s.as_ref().to_string()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog has no attributes.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of one attribute.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    /// Name of one attribute.
    pub fn name_of(&self, index: usize) -> Result<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                index,
                size: self.names.len(),
            })
    }

    /// Resolve names to indices, preserving order and length.
    pub fn indices_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.index_of(n.as_ref())).collect()
    }

    /// Resolve indices to names, preserving order and length.
    pub fn names_of(&self, indices: &[usize]) -> Result<Vec<&str>> {
        indices.iter().map(|&i| self.name_of(i)).collect()
    }

    /// Attribute names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate `(index, name)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_build_and_lookup() {
        let catalog = AttributeCatalog::build(["Smiling", "Male", "Eyeglasses"]).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.indices_of(&["Eyeglasses", "Smiling"]).unwrap(), vec![2, 0]);
        assert_eq!(catalog.names_of(&[1, 1]).unwrap(), vec!["Male", "Male"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = AttributeCatalog::build(["Bald", "Young", "Bald"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateAttribute(ref n) if n == "Bald"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_and_out_of_range() {
        let catalog = AttributeCatalog::build(["Bald"]).unwrap();
        assert!(matches!(
            catalog.indices_of(&["Bangs"]),
            Err(Error::UnknownAttribute(_))
        ));
        assert!(matches!(
            catalog.names_of(&[0, 1]),
            Err(Error::IndexOutOfRange { index: 1, size: 1 })
        ));
    }

    #[test]
    fn test_celeba_without() {
        let full = AttributeCatalog::celeba();
        assert_eq!(full.len(), 40);

        let model = full.without(&["Attractive", "Pale_Skin", "Blurry", "Not_There"]);
        assert_eq!(model.len(), 37);
        assert!(model.index_of("Attractive").is_err());
        // Re-indexed: Bags_Under_Eyes moves down one slot.
        assert_eq!(model.index_of("Bags_Under_Eyes").unwrap(), 2);
    }

    #[test]
    fn test_subset_order() {
        let full = AttributeCatalog::celeba();
        let sub = full.subset(&["Young", "Bald"]).unwrap();
        assert_eq!(sub.names(), &["Young".to_string(), "Bald".to_string()]);
        assert!(full.subset(&["Young", "Young"]).is_err());
        assert!(full.subset(&["Freckles"]).is_err());
    }
}
