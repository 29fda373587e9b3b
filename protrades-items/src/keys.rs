//! Store keys reserved for the well-known metadata fields.
//!
//! Custom tags are always stored as `namespace:key`, so none of these can
//! collide with one.

pub const DISPLAY_NAME: &str = "display_name";
pub const LORE: &str = "lore";
pub const ENCHANTMENTS: &str = "enchantments";
pub const ITEM_FLAGS: &str = "item_flags";
pub const CUSTOM_MODEL_DATA: &str = "custom_model_data";
pub const UNBREAKABLE: &str = "unbreakable";

pub const RESERVED: [&str; 6] = [
    DISPLAY_NAME,
    LORE,
    ENCHANTMENTS,
    ITEM_FLAGS,
    CUSTOM_MODEL_DATA,
    UNBREAKABLE,
];

/// Whether `key` names a well-known field rather than a custom tag.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}
