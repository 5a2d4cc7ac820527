use crate::types::{DataQuality, DataSource, ModuleTag, OverallQuality};

pub fn tag(module: &str, source: DataSource) -> ModuleTag {
    ModuleTag {
        module: module.to_string(),
        source,
    }
}

/// Roll provenance tags up into a quality score.
///
/// An empty tag list scores 0 (low).
pub fn assess_quality(modules: Vec<ModuleTag>) -> DataQuality {
    let total_modules = modules.len();
    let real_data_count = modules.iter().filter(|t| t.source.is_real()).count();
    let quality_score = if total_modules == 0 {
        0.0
    } else {
        let raw = real_data_count as f64 / total_modules as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    };

    DataQuality {
        modules,
        real_data_count,
        total_modules,
        quality_score,
        overall_quality: OverallQuality::from_score(quality_score),
    }
}
