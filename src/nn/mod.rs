//! Gated convolutional layers with automatic differentiation support
//!
//! ## Architecture Components
//!
//! - `Conv2d`: 3x3 valid convolution layer holding kernel and optional bias
//! - `WigGate`: weighted-sigmoid-gate unit, `sigmoid(conv_g(x)) * conv_v(x)`
//! - `WigBlock`: a gated feature unit plus its per-class prediction head
//! - `WigEnsemble`: stacked blocks whose pooled heads are averaged into one
//!   softmax output
//! - `ModelConfig`: configuration for the ensemble
//!
//! ## Example
//!
//! ```ignore
//! use wig_ensemble::nn::{build_model, ModelConfig};
//!
//! let config = ModelConfig::cifar(10);
//! let model = build_model(&config, &mut rng);
//! let probs = model.forward(&images, &Context::evaluation());
//! ```

mod config;
mod conv;
mod ensemble;
mod init;
mod wig;

pub use config::ModelConfig;
pub use conv::Conv2d;
pub use ensemble::{build_model, WigEnsemble};
pub use init::Initializer;
pub use wig::{WigBlock, WigGate};
