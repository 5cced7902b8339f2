//! Image data: CIFAR loading, augmentation and mixup batch generation
//!
//! The training stream is layered:
//!
//! ```text
//! ImageBatch ──▶ AugmentedFlow ──▶ ColorJitter ──▶ BatchGenerator ──▶ MixupGenerator
//!  (dataset)     (shuffle+affine)   (per image)     (exact-size queue)   (Beta blend)
//! ```
//!
//! Every stage is an endless [`Iterator`]; the generators always yield exactly
//! `batch_size` rows even though the flow's chunks vary in size.

mod augment;
mod batch;
mod cifar;
mod color;
mod flow;
mod generator;
mod mixup;

pub use augment::{AffineParams, AugmentConfig, ImageAugmenter};
pub use batch::ImageBatch;
pub use cifar::{balanced_subset, load_dataset, parse_records, Dataset, DatasetKind};
pub use color::{ColorJitter, ColorParams};
pub use flow::AugmentedFlow;
pub use generator::BatchGenerator;
pub use mixup::{mix, MixupGenerator};
