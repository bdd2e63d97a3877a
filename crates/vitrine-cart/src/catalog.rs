//! Product catalog

use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// A flattened catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: u64,
    pub image: String,
}

/// The product catalog, parsed from the upstream catalog document
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

// The catalog document nests each product under `fields`/`sys` wrappers;
// only the four fields we project out are required, the rest is ignored.

#[derive(Deserialize)]
struct CatalogDoc {
    items: Vec<CatalogItem>,
}

#[derive(Deserialize)]
struct CatalogItem {
    sys: ItemSys,
    fields: ItemFields,
}

#[derive(Deserialize)]
struct ItemSys {
    id: String,
}

#[derive(Deserialize)]
struct ItemFields {
    title: String,
    price: u64,
    image: ItemImage,
}

#[derive(Deserialize)]
struct ItemImage {
    fields: ImageFields,
}

#[derive(Deserialize)]
struct ImageFields {
    file: ImageFile,
}

#[derive(Deserialize)]
struct ImageFile {
    url: String,
}

impl Catalog {
    /// Parse the nested catalog document into a flat product list
    pub fn from_json(data: &[u8]) -> Result<Self, CartError> {
        let doc: CatalogDoc =
            serde_json::from_slice(data).map_err(|e| CartError::Catalog(e.to_string()))?;

        let products = doc
            .items
            .into_iter()
            .map(|item| Product {
                id: item.sys.id,
                title: item.fields.title,
                price: item.fields.price,
                image: item.fields.image.fields.file.url,
            })
            .collect();

        Ok(Self { products })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
