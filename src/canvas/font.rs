use std::fs;

use ab_glyph::FontArc;
use anyhow::{Context, Result, anyhow};
use fontdb::{Database, Family, Query, Source};

/// Serif first, like the printed captions this tool imitates.
const PREFERRED_FAMILIES: &[&str] = &[
    "Times New Roman",
    "Liberation Serif",
    "DejaVu Serif",
    "Noto Serif",
];

/// Loads a system font for captions and metric readouts.
pub fn load_caption_font() -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let families = PREFERRED_FAMILIES
        .iter()
        .copied()
        .map(Family::Name)
        .chain([Family::Serif, Family::SansSerif]);

    for family in families {
        if let Some(id) = db.query(&Query {
            families: &[family],
            ..Default::default()
        }) {
            if let Some(font) = load_face(&db, id)? {
                return Ok(font);
            }
        }
    }

    for face in db.faces() {
        if let Some(font) = load_face(&db, face.id)? {
            return Ok(font);
        }
    }

    Err(anyhow!("no usable system font found"))
}

fn load_face(db: &Database, id: fontdb::ID) -> Result<Option<FontArc>> {
    let face = db.face(id).context("missing font face in database")?;
    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => fs::read(path)
            .with_context(|| format!("failed to read font at {}", path.display()))?,
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    match FontArc::try_from_vec(data) {
        Ok(font) => Ok(Some(font)),
        Err(err) => {
            tracing::debug!(error = %err, face = %face.post_script_name, "skipping undecodable font face");
            Ok(None)
        }
    }
}
