use crate::{Error, ItemStack, Result, TradeId};

/// An exchange rule: the inputs are consumed, the output is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    id: TradeId,
    inputs: Vec<ItemStack>,
    output: ItemStack,
}

impl Trade {
    /// Builds a trade. At least one input is required.
    pub fn new(id: TradeId, inputs: Vec<ItemStack>, output: ItemStack) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::Validation(format!("trade {id} has no inputs")));
        }
        Ok(Self { id, inputs, output })
    }

    #[must_use]
    pub fn id(&self) -> &TradeId {
        &self.id
    }

    #[must_use]
    pub fn inputs(&self) -> &[ItemStack] {
        &self.inputs
    }

    #[must_use]
    pub fn output(&self) -> &ItemStack {
        &self.output
    }

    /// Splits the trade into its id, inputs and output.
    #[must_use]
    pub fn into_parts(self) -> (TradeId, Vec<ItemStack>, ItemStack) {
        (self.id, self.inputs, self.output)
    }
}
