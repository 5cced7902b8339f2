//! CIFAR-10 / CIFAR-100 binary-format loader
//!
//! Records are `label byte(s) + 3072 pixel bytes`, pixels stored channel-major
//! (1024 red, 1024 green, 1024 blue, each row-major 32x32). CIFAR-100 records
//! carry a coarse and a fine label byte; the fine label is used.

use super::ImageBatch;
use crate::{Error, Result};
use ndarray::{Array2, Array4, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SIDE: usize = 32;
const CHANNELS: usize = 3;
const PIXELS: usize = SIDE * SIDE * CHANNELS;

/// Total training samples kept by default, spread evenly over the classes
pub const DEFAULT_TRAIN_SAMPLES: usize = 1000;

/// Which CIFAR distribution to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Cifar10,
    Cifar100,
}

impl DatasetKind {
    /// Map a class count (10 or 100) to a dataset
    pub fn from_classes(nb_classes: usize) -> Result<Self> {
        match nb_classes {
            10 => Ok(Self::Cifar10),
            100 => Ok(Self::Cifar100),
            n => Err(Error::InvalidConfig(format!("unsupported class count {n}, expected 10 or 100"))),
        }
    }

    pub fn num_classes(self) -> usize {
        match self {
            Self::Cifar10 => 10,
            Self::Cifar100 => 100,
        }
    }

    /// Directory the binary distribution unpacks to
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Cifar10 => "cifar-10-batches-bin",
            Self::Cifar100 => "cifar-100-binary",
        }
    }

    pub fn train_files(self) -> &'static [&'static str] {
        match self {
            Self::Cifar10 => &[
                "data_batch_1.bin",
                "data_batch_2.bin",
                "data_batch_3.bin",
                "data_batch_4.bin",
                "data_batch_5.bin",
            ],
            Self::Cifar100 => &["train.bin"],
        }
    }

    pub fn test_files(self) -> &'static [&'static str] {
        match self {
            Self::Cifar10 => &["test_batch.bin"],
            Self::Cifar100 => &["test.bin"],
        }
    }

    fn label_bytes(self) -> usize {
        match self {
            Self::Cifar10 => 1,
            Self::Cifar100 => 2,
        }
    }

    /// Bytes per record
    pub fn record_len(self) -> usize {
        self.label_bytes() + PIXELS
    }

    /// Per-class training samples when none is configured
    pub fn default_train_per_class(self) -> usize {
        DEFAULT_TRAIN_SAMPLES / self.num_classes()
    }
}

/// Training and test images for one CIFAR variant
#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub train: ImageBatch,
    pub test: ImageBatch,
}

/// Decode binary records into `[N, 32, 32, 3]` images in `[0, 1]` and one-hot labels
pub fn parse_records(bytes: &[u8], kind: DatasetKind) -> Result<ImageBatch> {
    let record_len = kind.record_len();
    if bytes.len() % record_len != 0 {
        return Err(Error::Dataset(format!(
            "{} bytes is not a whole number of {record_len}-byte records",
            bytes.len()
        )));
    }
    let n = bytes.len() / record_len;
    let classes = kind.num_classes();
    let label_offset = kind.label_bytes() - 1;

    let mut images = Array4::<f32>::zeros((n, SIDE, SIDE, CHANNELS));
    let mut labels = Array2::<f32>::zeros((n, classes));

    for (i, record) in bytes.chunks_exact(record_len).enumerate() {
        let label = usize::from(record[label_offset]);
        if label >= classes {
            return Err(Error::Dataset(format!("record {i}: label {label} out of range")));
        }
        labels[[i, label]] = 1.0;

        let pixels = &record[kind.label_bytes()..];
        for c in 0..CHANNELS {
            for y in 0..SIDE {
                for x in 0..SIDE {
                    let v = pixels[c * SIDE * SIDE + y * SIDE + x];
                    images[[i, y, x, c]] = f32::from(v) / 255.0;
                }
            }
        }
    }

    ImageBatch::new(images, labels)
}

/// Keep the first `per_class` rows of each class, preserving file order
pub fn balanced_subset(batch: &ImageBatch, per_class: usize) -> ImageBatch {
    let mut taken = vec![0usize; batch.num_classes()];
    let indices: Vec<usize> = batch
        .labels
        .axis_iter(Axis(0))
        .enumerate()
        .filter_map(|(i, row)| {
            let class = argmax(row.iter().copied());
            (taken[class] < per_class).then(|| {
                taken[class] += 1;
                i
            })
        })
        .collect();
    batch.select(&indices)
}

fn argmax(values: impl Iterator<Item = f32>) -> usize {
    values
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn read_split(dir: &Path, files: &[&str], kind: DatasetKind) -> Result<ImageBatch> {
    let mut out = ImageBatch::empty([SIDE, SIDE, CHANNELS], kind.num_classes());
    for file in files {
        let path: PathBuf = dir.join(file);
        let bytes = std::fs::read(&path).map_err(|e| {
            Error::Dataset(format!("cannot read {}: {e}", path.display()))
        })?;
        let part = parse_records(&bytes, kind)
            .map_err(|e| Error::Dataset(format!("{}: {e}", path.display())))?;
        debug!(file = %path.display(), records = part.len(), "read CIFAR file");
        out = out.concat(&part)?;
    }
    Ok(out)
}

/// Load a CIFAR dataset from `root/<dir_name>/`
///
/// The training split is reduced to the first `train_per_class` samples of
/// every class (default: 1000 samples in total); the test split is kept whole.
pub fn load_dataset(
    kind: DatasetKind,
    root: impl AsRef<Path>,
    train_per_class: Option<usize>,
) -> Result<Dataset> {
    let dir = root.as_ref().join(kind.dir_name());
    if !dir.is_dir() {
        return Err(Error::Dataset(format!(
            "dataset directory {} not found (expected the CIFAR binary distribution)",
            dir.display()
        )));
    }

    let per_class = train_per_class.unwrap_or_else(|| kind.default_train_per_class());
    let full_train = read_split(&dir, kind.train_files(), kind)?;
    let train = balanced_subset(&full_train, per_class);
    let test = read_split(&dir, kind.test_files(), kind)?;

    info!(
        classes = kind.num_classes(),
        train = train.len(),
        test = test.len(),
        "loaded dataset"
    );
    Ok(Dataset { kind, train, test })
}
