use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{Product, ProductId};

/// Published on the request topic, keyed by `correlation_id`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ValidateProductsRequest {
    pub correlation_id: Uuid,
    pub reply_to: String,
    pub product_ids: Vec<ProductId>,
}

/// Consumed from the reply topic.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ValidateProductsReply {
    pub correlation_id: Uuid,
    #[serde(flatten)]
    pub outcome: ReplyOutcome,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub(crate) enum ReplyOutcome {
    Products { products: Vec<Product> },
    Error { error: RemoteError },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct RemoteError {
    #[serde(default = "default_status")]
    pub status: u16,
    pub message: String,
}

fn default_status() -> u16 {
    400
}
