use crate::error::OcrError;
use crate::ocr::{BBoxPx, RecognizedWord};

const WORD_LEVEL: i32 = 5;

/// Word rows of a Tesseract TSV report, in the order the engine wrote them.
pub(super) fn parse_tsv_words(tsv: &str) -> Result<Vec<RecognizedWord>, OcrError> {
    let mut lines = tsv.lines().filter(|line| !line.trim().is_empty());
    match lines.next() {
        Some(header) if header.starts_with("level") => {}
        Some(other) => {
            return Err(OcrError::Output(format!(
                "missing tsv header, got: {}",
                other.chars().take(60).collect::<String>()
            )));
        }
        None => return Err(OcrError::Output("empty tsv output".to_string())),
    }

    let mut words = Vec::new();
    for row in lines {
        let cols = row.trim_end_matches('\r').split('\t').collect::<Vec<_>>();
        if cols.len() < 11 {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let left: u32 = cols[6].parse().unwrap_or(0);
        let top: u32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);
        let confidence: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let text = cols.get(11).copied().unwrap_or("");

        words.push(RecognizedWord {
            text: text.to_string(),
            confidence,
            bbox: BBoxPx {
                x: left,
                y: top,
                w: width,
                h: height,
            },
        });
    }
    Ok(words)
}
