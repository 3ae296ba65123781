use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "khmer-ocr-rust",
    version,
    about = "OCR Khmer/English scans and PDFs into Word documents"
)]
struct Cli {
    /// File to recognize (pdf, jpg, jpeg, png, bmp, tiff)
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Detect the font of the first word in --data instead of running OCR
    #[arg(long = "detect-font")]
    detect_font: bool,

    /// Directory for generated .docx files (overrides settings [server] output_dir)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<String>,

    /// Font classifier model (JSON linear SVM)
    #[arg(long = "font-model")]
    font_model: Option<String>,

    /// Show installed Tesseract language packs and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Start the HTTP server on the given address (e.g. 127.0.0.1:8080)
    #[arg(long = "server")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    khmer_ocr_rust::logging::init(cli.verbose)?;

    let config = khmer_ocr_rust::Config {
        data: cli.data,
        detect_font: cli.detect_font,
        output_dir: cli.output_dir,
        font_model: cli.font_model,
        settings_path: cli.read_settings,
        show_ocr_languages: cli.show_ocr_languages,
        server: cli.server,
    };
    let output = khmer_ocr_rust::run(config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
