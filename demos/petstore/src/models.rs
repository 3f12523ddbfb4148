use axopen::prelude::*;

/// A pet in the store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Reflect)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[garde(skip)]
    pub id: u64,
    /// Name shown on the adoption board
    #[garde(length(min = 1, max = 64))]
    #[reflect(example = "Rex")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
pub struct NewPet {
    #[garde(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default)]
    #[garde(skip)]
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
pub struct ListPets {
    /// Only pets carrying this tag
    #[serde(default)]
    #[garde(skip)]
    pub tag: Option<String>,
    #[garde(range(min = 0, max = 100))]
    #[reflect(description = "Maximum number of pets to return")]
    pub limit: i32,
}

#[derive(Debug, Deserialize, Validate, Reflect)]
pub struct PetPath {
    #[serde(rename = "petId")]
    #[reflect(path = "petId")]
    #[garde(range(min = 1))]
    pub pet_id: u64,
}
