use lopdf::{
  content::{Content, Operation},
  dictionary, Dictionary, Document, Object, Stream,
};

use super::*;
use crate::{
  extract::MetadataExtractor,
  format::generate_filename,
  pdf::{PdfProperties, PropertyReader},
  rename::apply_metadata_naming,
  text::{TextExtractionChain, TextExtractor},
};

/// Writes a small PDF with one Courier text line per `\n` separated line of each page.
pub(crate) fn write_pdf(
  path: &Path,
  info: &[(&str, &str)],
  pages: &[&str],
) -> anyhow::Result<PathBuf> {
  let mut doc = Document::with_version("1.5");
  let pages_id = doc.new_object_id();
  let font_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Courier",
  });
  let resources_id = doc.add_object(dictionary! {
    "Font" => dictionary! { "F1" => font_id },
  });

  let mut kids: Vec<Object> = Vec::new();
  for page in pages {
    let mut operations = vec![
      Operation::new("BT", vec![]),
      Operation::new("Tf", vec!["F1".into(), 12.into()]),
      Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (index, line) in page.lines().enumerate() {
      if index > 0 {
        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
      }
      operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
      "Resources" => resources_id,
      "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    kids.push(page_id.into());
  }

  let count = kids.len() as i64;
  doc.objects.insert(
    pages_id,
    Object::Dictionary(dictionary! {
      "Type" => "Pages",
      "Kids" => kids,
      "Count" => count,
    }),
  );
  let catalog_id = doc.add_object(dictionary! {
    "Type" => "Catalog",
    "Pages" => pages_id,
  });
  doc.trailer.set("Root", catalog_id);

  if !info.is_empty() {
    let mut dict = Dictionary::new();
    for (key, value) in info {
      dict.set(*key, Object::string_literal(*value));
    }
    let info_id = doc.add_object(dict);
    doc.trailer.set("Info", info_id);
  }

  doc.save(path)?;
  Ok(path.to_path_buf())
}

/// Property reader returning fixed properties, or a read error for `None`.
pub(crate) struct FixedProperties(pub Option<PdfProperties>);

impl PropertyReader for FixedProperties {
  fn read_properties(&self, _path: &Path) -> Result<PdfProperties> {
    self.0.clone().ok_or_else(|| {
      OrganizeError::Path(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
    })
  }
}

/// Text extractor returning fixed text.
pub(crate) struct FixedText(pub &'static str);

impl FixedText {
  /// A chain consisting of just this extractor.
  pub fn chain(text: &'static str) -> TextExtractionChain {
    TextExtractionChain::new(vec![Box::new(FixedText(text))])
  }
}

impl TextExtractor for FixedText {
  fn name(&self) -> &'static str { "fixed" }

  fn extract_text(&self, _path: &Path) -> Result<String> { Ok(self.0.to_string()) }
}

/// Settings without the text and API layer.
pub(crate) fn offline_config() -> ExtractionConfig {
  ExtractionConfig { enhanced: false, ..ExtractionConfig::default() }
}

/// Settings pointing both APIs at a mock server without request spacing.
pub(crate) fn mock_config(server: &mockito::ServerGuard) -> ExtractionConfig {
  ExtractionConfig {
    arxiv: ClientConfig::arxiv()
      .with_base_url(format!("{}/api/query", server.url()))
      .with_min_interval(Duration::ZERO),
    crossref: ClientConfig::crossref()
      .with_base_url(format!("{}/works", server.url()))
      .with_min_interval(Duration::ZERO),
    ..ExtractionConfig::default()
  }
}

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2401.12345v1</id>
    <published>2024-01-22T18:00:00Z</published>
    <title>Scaling Laws for
  Tiny Models</title>
    <summary>We study tiny models.</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

#[traced_test]
#[tokio::test]
async fn test_arxiv_paper_named_from_api() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let arxiv = server
    .mock("GET", "/api/query")
    .match_query(mockito::Matcher::UrlEncoded("id_list".into(), "2401.12345v1".into()))
    .with_status(200)
    .with_body(ARXIV_FEED)
    .create_async()
    .await;

  let dir = tempdir()?;
  let path = write_pdf(&dir.path().join("2401.12345v1.pdf"), &[], &[
    "Scaling Laws for Tiny Models\narXiv:2401.12345v1 [cs.LG] 22 Jan 2024",
    "1 Introduction",
  ])?;

  let extractor = MetadataExtractor::new(mock_config(&server));
  let renamed = apply_metadata_naming(&extractor, &path).await?;
  arxiv.assert_async().await;

  assert_eq!(renamed, dir.path().join("Lovelace_2024_Scaling_Laws_for_Tiny_Models.pdf"));
  assert!(renamed.exists());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_embedded_properties_win_over_crossref() -> anyhow::Result<()> {
  let mut server = mockito::Server::new_async().await;
  let crossref = server
    .mock("GET", "/works/10.1145/3313831.3376166")
    .with_status(200)
    .with_body(
      r#"{"message": {
        "title": ["API Title"],
        "author": [{"given": "Api", "family": "Author"}],
        "published-online": {"date-parts": [[2020, 4, 21]]}
      }}"#,
    )
    .create_async()
    .await;

  let dir = tempdir()?;
  let path = write_pdf(&dir.path().join("chi.pdf"), &[("Title", "Embedded Title")], &[
    "https://doi.org/10.1145/3313831.3376166",
  ])?;

  let metadata = MetadataExtractor::new(mock_config(&server)).extract(&path).await;
  crossref.assert_async().await;

  assert_eq!(metadata.doi(), Some("10.1145/3313831.3376166"));
  assert_eq!(generate_filename(&metadata, "chi.pdf"), "Author_2020_Embedded_Title.pdf");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unreachable_apis_do_not_block_naming() -> anyhow::Result<()> {
  // Nothing listens on the discard port
  let config = ExtractionConfig {
    arxiv: ClientConfig::arxiv()
      .with_base_url("http://127.0.0.1:9/api/query")
      .with_min_interval(Duration::ZERO),
    crossref: ClientConfig::crossref()
      .with_base_url("http://127.0.0.1:9/works")
      .with_min_interval(Duration::ZERO),
    ..ExtractionConfig::default()
  };

  let dir = tempdir()?;
  let path = write_pdf(
    &dir.path().join("paper.pdf"),
    &[("Title", "Offline Paper (2019)"), ("Author", "Jane Roe")],
    &["DOI: 10.1000/xyz123 and arXiv:1901.00001"],
  )?;

  let metadata = MetadataExtractor::new(config).extract(&path).await;
  assert_eq!(metadata.doi(), Some("10.1000/xyz123"));
  assert_eq!(metadata.arxiv_id(), Some("1901.00001"));
  assert_eq!(generate_filename(&metadata, "paper.pdf"), "Roe_2019_Offline_Paper_2019.pdf");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_corrupt_pdf_keeps_its_name() -> anyhow::Result<()> {
  let dir = tempdir()?;
  let path = dir.path().join("corrupt.pdf");
  std::fs::write(&path, b"%PDF-1.4\nthis is not really a pdf")?;

  let extractor = MetadataExtractor::new(offline_config());
  assert_eq!(apply_metadata_naming(&extractor, &path).await?, path);
  Ok(())
}
