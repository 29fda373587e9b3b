//! Whole-item text encoding.

use crate::{ItemsError, Result};
use protrades_nbt::codec::{self, Frame};
use protrades_nbt::{CodecError, CodecResult};
use protrades_types::ItemStack;

/// Encodes type, quantity, metadata, custom tags and clone record.
pub fn encode_item(item: &ItemStack) -> CodecResult<String> {
    codec::seal(Frame::Item, item)
}

/// Reverses [`encode_item`]. An item with zero quantity is rejected.
pub fn decode_item(text: &str) -> CodecResult<ItemStack> {
    let item: ItemStack = codec::unseal(Frame::Item, text)?;
    if item.quantity() == 0 {
        return Err(CodecError::InvalidPayload(format!(
            "{} has zero quantity",
            item.item_type()
        )));
    }
    Ok(item)
}

/// Parses a stored item string: the legacy `TYPE:AMOUNT` form or the
/// encoded form.
pub fn parse_item(text: &str) -> Result<ItemStack> {
    let text = text.trim();
    if looks_legacy(text) {
        return parse_legacy(text);
    }
    match decode_item(text) {
        Ok(item) => Ok(item),
        Err(e) => parse_legacy(text).map_err(|_| ItemsError::Codec(e)),
    }
}

fn looks_legacy(text: &str) -> bool {
    text.matches(':').count() == 1 && !text.contains('=')
}

fn parse_legacy(text: &str) -> Result<ItemStack> {
    let bad = || ItemsError::LegacyFormat(text.to_string());
    let (item_type, amount) = text.split_once(':').ok_or_else(bad)?;
    let amount: u32 = amount.trim().parse().map_err(|_| bad())?;
    if amount == 0 {
        return Err(bad());
    }
    ItemStack::of(item_type, amount).map_err(|_| bad())
}
