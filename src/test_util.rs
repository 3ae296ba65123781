#[cfg(test)]
pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME is only touched while HOME_MUTEX is held.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    if let Some(old) = old_home {
        unsafe { std::env::set_var("HOME", old) };
    } else {
        unsafe { std::env::remove_var("HOME") };
    }
    result
}

#[cfg(test)]
pub(crate) mod stub {
    use std::sync::Mutex;

    use image::GrayImage;

    use crate::error::OcrError;
    use crate::ocr::{BBoxPx, LayoutMode, OcrEngine, RecognizedWord};

    pub(crate) fn word(text: &str, confidence: f32) -> RecognizedWord {
        RecognizedWord {
            text: text.to_string(),
            confidence,
            bbox: BBoxPx {
                x: 0,
                y: 0,
                w: 10,
                h: 10,
            },
        }
    }

    /// Replays one canned word list per call, in call order.
    pub(crate) struct ScriptedEngine {
        pages: Vec<Vec<RecognizedWord>>,
        calls: Mutex<Vec<LayoutMode>>,
    }

    impl ScriptedEngine {
        pub(crate) fn new(pages: Vec<Vec<RecognizedWord>>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn modes(&self) -> Vec<LayoutMode> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn detect_words(
            &self,
            _image: &GrayImage,
            mode: LayoutMode,
        ) -> Result<Vec<RecognizedWord>, OcrError> {
            let mut calls = self.calls.lock().expect("calls lock");
            let index = calls.len();
            calls.push(mode);
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        }
    }

    /// Recognizes one word per page until call `fail_on` (1-based), which fails.
    pub(crate) struct FlakyEngine {
        fail_on: usize,
        calls: Mutex<usize>,
    }

    impl FlakyEngine {
        pub(crate) fn new(fail_on: usize) -> Self {
            Self {
                fail_on,
                calls: Mutex::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            *self.calls.lock().expect("calls lock")
        }
    }

    impl OcrEngine for FlakyEngine {
        fn detect_words(
            &self,
            _image: &GrayImage,
            _mode: LayoutMode,
        ) -> Result<Vec<RecognizedWord>, OcrError> {
            let mut calls = self.calls.lock().expect("calls lock");
            *calls += 1;
            if *calls == self.fail_on {
                return Err(OcrError::Engine(format!("page {} unreadable", *calls)));
            }
            Ok(vec![word("page", 50.0)])
        }
    }

    pub(crate) struct FailingEngine;

    impl OcrEngine for FailingEngine {
        fn detect_words(
            &self,
            _image: &GrayImage,
            _mode: LayoutMode,
        ) -> Result<Vec<RecognizedWord>, OcrError> {
            Err(OcrError::Engine("engine offline".to_string()))
        }
    }
}

pub(crate) mod pdf {
    use crate::source::command::PdfRenderer;

    pub(crate) fn renderer_installed() -> bool {
        PdfRenderer::detect().is_some()
    }

    /// Minimal PDF, one 100x100pt page per entry, each with a black bar of
    /// the given width.
    pub(crate) fn pdf_with_bars(widths: &[u32]) -> Vec<u8> {
        let kids: Vec<String> = (0..widths.len())
            .map(|idx| format!("{} 0 R", 3 + idx * 2))
            .collect();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                widths.len()
            ),
        ];
        for (idx, width) in widths.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 100 100] /Resources << >> /Contents {} 0 R >>",
                4 + idx * 2
            ));
            let stream = format!("0 0 0 rg 10 40 {} 20 re f", width);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (idx, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", idx + 1, body).as_bytes());
        }
        let xref = out.len();
        out.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        out
    }
}
