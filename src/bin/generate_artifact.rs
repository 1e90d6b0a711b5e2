use anyhow::{Context, Result};
use bigmac_engine::core::artifact::{
    ArtifactDocument, Manifest, ARTIFACT_FORMAT_VERSION, MANIFEST_ENTRY, MODEL_ENTRY,
    PREPROCESSOR_ENTRY,
};
use bigmac_engine::core::encoder::{ColumnTransform, ColumnTransformer, HandleUnknown, InputColumn};
use bigmac_engine::core::regressor::{Model, TreeNode};
use clap::Parser;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Baseline price level (USD) per country, roughly the mid-2010s index.
const COUNTRY_LEVELS: [(&str, f64); 25] = [
    ("Argentina", 4.9),
    ("Australia", 4.8),
    ("Brazil", 4.4),
    ("Britain", 5.0),
    ("Canada", 5.3),
    ("Chile", 4.6),
    ("China", 3.4),
    ("Colombia", 4.0),
    ("Denmark", 5.0),
    ("Egypt", 2.3),
    ("Euro area", 5.6),
    ("Hong Kong", 3.0),
    ("India", 2.6),
    ("Indonesia", 2.4),
    ("Japan", 3.1),
    ("Mexico", 4.1),
    ("Norway", 6.8),
    ("Poland", 4.1),
    ("South Africa", 2.9),
    ("Sweden", 6.0),
    ("Switzerland", 7.7),
    ("Taiwan", 2.4),
    ("Turkey", 3.8),
    ("United States", 5.7),
    ("Uruguay", 6.5),
];

const YEAR_MEAN: f64 = 2012.0;
const YEAR_SCALE: f64 = 7.0;
const MONTH_MEAN: f64 = 6.5;
const MONTH_SCALE: f64 = 3.45;

#[derive(Parser)]
#[command(name = "generate_artifact")]
#[command(about = "Write a deterministic synthetic Big Mac model artifact")]
struct Args {
    /// Output file (.json document or .zip bundle)
    #[arg(short, long, default_value = "bigmac_model.json")]
    output: String,

    /// Force the zip bundle layout regardless of extension
    #[arg(long)]
    zip: bool,
}

fn build_document() -> ArtifactDocument {
    let categories: Vec<String> = COUNTRY_LEVELS.iter().map(|(c, _)| c.to_string()).collect();
    let year_column = categories.len();

    // 線性模型：國家水準 + 年份趨勢 + 微小的季節項
    let mut coefficients: Vec<f64> = COUNTRY_LEVELS.iter().map(|(_, level)| *level).collect();
    coefficients.push(0.85);
    coefficients.push(0.02);

    let linear = Model::Linear {
        coefficients,
        intercept: 0.0,
    };

    // 決策樹：依年份分段的全球水準
    let tree = Model::DecisionTree {
        n_features: year_column + 2,
        nodes: vec![
            TreeNode::split(year_column, -0.5, 1, 2),
            TreeNode::leaf(2.6),
            TreeNode::split(year_column, 0.7, 3, 4),
            TreeNode::leaf(3.8),
            TreeNode::leaf(5.1),
        ],
    };

    ArtifactDocument {
        format_version: ARTIFACT_FORMAT_VERSION,
        model: Model::Voting {
            estimators: vec![linear, tree],
            weights: Some(vec![0.75, 0.25]),
        },
        preprocessor: ColumnTransformer {
            transformers: vec![
                ColumnTransform::OneHot {
                    name: "cat".to_string(),
                    column: InputColumn::Name,
                    categories,
                    handle_unknown: HandleUnknown::Error,
                },
                ColumnTransform::StandardScaler {
                    name: "num".to_string(),
                    columns: vec![InputColumn::Year, InputColumn::Month],
                    mean: vec![YEAR_MEAN, MONTH_MEAN],
                    scale: vec![YEAR_SCALE, MONTH_SCALE],
                },
            ],
        },
    }
}

fn zip_bundle(document: &ArtifactDocument) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    let manifest = Manifest {
        format_version: document.format_version,
    };
    let entries = [
        (MANIFEST_ENTRY, serde_json::to_vec_pretty(&manifest)?),
        (MODEL_ENTRY, serde_json::to_vec_pretty(&document.model)?),
        (PREPROCESSOR_ENTRY, serde_json::to_vec_pretty(&document.preprocessor)?),
    ];
    for (name, data) in entries {
        zip.start_file::<_, ()>(name, FileOptions::default())
            .with_context(|| format!("Failed to start zip entry {}", name))?;
        zip.write_all(&data)?;
    }

    let cursor = zip.finish().context("Failed to finish zip bundle")?;
    Ok(cursor.into_inner())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let document = build_document();

    let bytes = if args.zip || args.output.ends_with(".zip") {
        zip_bundle(&document)?
    } else {
        serde_json::to_vec_pretty(&document)?
    };

    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write artifact to {}", args.output))?;

    println!(
        "Wrote {} ({} bytes, {} countries)",
        args.output,
        bytes.len(),
        COUNTRY_LEVELS.len()
    );
    Ok(())
}
