use image::{GrayImage, Rgb, RgbImage};
use std::sync::Mutex;

use khmer_ocr_rust::document::read_docx_paragraphs;
use khmer_ocr_rust::ocr::BBoxPx;
use khmer_ocr_rust::{
    LayoutMode, OcrEngine, OcrError, OcrPipeline, OutputStore, PipelineError, PipelineOptions,
    RecognizedWord,
};

/// Answers every page with the same words and remembers the image sizes it saw.
struct EchoEngine {
    words: Vec<(&'static str, f32)>,
    sizes: Mutex<Vec<(u32, u32)>>,
}

impl OcrEngine for EchoEngine {
    fn detect_words(
        &self,
        image: &GrayImage,
        _mode: LayoutMode,
    ) -> Result<Vec<RecognizedWord>, OcrError> {
        self.sizes.lock().unwrap().push(image.dimensions());
        Ok(self
            .words
            .iter()
            .map(|(text, confidence)| RecognizedWord {
                text: text.to_string(),
                confidence: *confidence,
                bbox: BBoxPx {
                    x: 0,
                    y: 0,
                    w: 4,
                    h: 4,
                },
            })
            .collect())
    }
}

#[test]
fn image_to_stored_docx() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invoice.png");
    RgbImage::from_pixel(100, 40, Rgb([255, 255, 255]))
        .save(&input)
        .unwrap();
    let engine = EchoEngine {
        words: vec![("វិក្កយបត្រ", 91.0), ("noise", -1.0), ("No.", 77.5), ("42", 88.0)],
        sizes: Mutex::new(Vec::new()),
    };
    let store = OutputStore::new(dir.path().join("out")).unwrap();
    let options = PipelineOptions::default();

    let outcome = OcrPipeline::new(&engine, &options)
        .run_file(&input, "invoice.png", &store)
        .unwrap();

    assert_eq!(*engine.sizes.lock().unwrap(), vec![(175, 70)]);
    insta::assert_snapshot!(outcome.text, @"វិក្កយបត្រ No. 42");

    let bytes = std::fs::read(&outcome.output.path).unwrap();
    assert_eq!(
        read_docx_paragraphs(&bytes).unwrap(),
        vec!["វិក្កយបត្រ No. 42".to_string()]
    );
    assert_eq!(
        store.resolve(&outcome.output.file_name).unwrap(),
        Some(outcome.output.path.clone())
    );
}

#[test]
fn unsupported_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "plain text").unwrap();
    let engine = EchoEngine {
        words: vec![],
        sizes: Mutex::new(Vec::new()),
    };
    let store = OutputStore::new(dir.path().join("out")).unwrap();
    let options = PipelineOptions::default();

    let err = OcrPipeline::new(&engine, &options)
        .run_file(&input, "notes.txt", &store)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Conversion(_)));
    assert_eq!(err.kind(), "conversion");
    assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
    assert!(engine.sizes.lock().unwrap().is_empty());
}
