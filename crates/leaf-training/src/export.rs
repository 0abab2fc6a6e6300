//! Model export.
//!
//! Persists the trained model twice: a full-precision record under
//! `saved_model/` and a half-precision binary record (`model.bin`) for
//! deployment, alongside `labels.txt` whose line order matches the label
//! indices used during training.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{BinFileRecorder, CompactRecorder, HalfPrecisionSettings};
use burn::tensor::backend::Backend;
use tracing::info;

use leaf_core::{Error, Result};
use leaf_model::LeafClassifier;

/// Paths of the exported artifacts.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    /// Full-precision record
    pub saved_model: PathBuf,
    /// Half-precision deployment record
    pub quantized: PathBuf,
    /// Newline-delimited label file
    pub labels: PathBuf,
}

/// Exports the trained model and the label file into `output_dir`.
///
/// The label file is written from the same class-name list that sized the
/// model's output layer, so line `i` always corresponds to output neuron
/// `i`.
pub fn export_model<B: Backend>(
    model: &LeafClassifier<B>,
    class_names: &[String],
    output_dir: &Path,
) -> Result<ExportPaths> {
    if class_names.len() != model.num_classes() {
        return Err(Error::Model(format!(
            "Label count {} does not match model output size {}",
            class_names.len(),
            model.num_classes()
        )));
    }

    let saved_model_dir = output_dir.join("saved_model");
    fs::create_dir_all(&saved_model_dir)?;

    model
        .clone()
        .save_file(saved_model_dir.join("model"), &CompactRecorder::new())
        .map_err(|e| Error::Model(format!("Failed to save full-precision model: {e}")))?;

    model
        .clone()
        .save_file(
            output_dir.join("model"),
            &BinFileRecorder::<HalfPrecisionSettings>::new(),
        )
        .map_err(|e| Error::Model(format!("Failed to save quantized model: {e}")))?;

    let labels = output_dir.join("labels.txt");
    write_labels(&labels, class_names)?;

    let paths = ExportPaths {
        saved_model: saved_model_dir.join("model.mpk"),
        quantized: output_dir.join("model.bin"),
        labels,
    };

    info!("Model exported successfully: {}", paths.quantized.display());
    Ok(paths)
}

/// Writes one class name per line, in label-index order.
pub fn write_labels(path: &Path, class_names: &[String]) -> Result<()> {
    let mut content = String::new();
    for name in class_names {
        content.push_str(name);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaf_core::{DefaultBackend, ModelSection};

    fn tiny_model(num_classes: usize) -> LeafClassifier<DefaultBackend> {
        let section = ModelSection {
            input_shape: [32, 32, 3],
            alpha: 0.25,
            weights: "random".to_string(),
            dropout: 0.2,
        };
        LeafClassifier::new(&section, num_classes, &Default::default()).unwrap()
    }

    #[test]
    fn test_write_labels_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");

        let names = vec![
            "Apple_scab".to_string(),
            "Mandua_blast".to_string(),
            "Tomato_blight".to_string(),
        ];
        write_labels(&path, &names).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["Apple_scab", "Mandua_blast", "Tomato_blight"]);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_export_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny_model(2);
        let names = vec!["Class_a".to_string(), "Class_b".to_string()];

        let paths = export_model(&model, &names, dir.path()).unwrap();

        assert!(paths.saved_model.exists());
        assert!(paths.quantized.exists());
        assert!(paths.labels.exists());

        let labels = fs::read_to_string(&paths.labels).unwrap();
        assert_eq!(labels.lines().count(), 2);
    }

    #[test]
    fn test_export_rejects_label_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let model = tiny_model(3);
        let names = vec!["only_one".to_string()];

        let result = export_model(&model, &names, dir.path());
        assert!(matches!(result, Err(Error::Model(_))));
    }
}
