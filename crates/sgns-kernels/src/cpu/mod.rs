//! CPU kernel implementations

pub mod activations;
pub mod backward;
pub mod forward;
pub mod loss;
pub mod pairs;
pub mod windowed;

pub use activations::{SIGMOID_CLAMP, clamped_sigmoid};
pub use backward::backward_distribute;
pub use forward::forward_score;
pub use loss::negative_sampling_gradients;
pub use pairs::batched_pair_update;
pub use windowed::windowed_update;
