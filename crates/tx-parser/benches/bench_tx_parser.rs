use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tx_parser::{normalize_whitespace, DocxParser, Extractor};

fn generate_text(size_kb: usize) -> String {
    let sentences = [
        "The world is everything that is the case.",
        "What is the case, the fact, is the existence of atomic facts.",
        "A logical picture of facts is a thought.\r\n",
        "Whereof one cannot speak, thereof one must be silent.\n\n\n\n",
    ];
    let mut text = String::with_capacity(size_kb * 1024);
    let mut i = 0;
    while text.len() < size_kb * 1024 {
        text.push_str(sentences[i % sentences.len()]);
        text.push(' ');
        i += 1;
    }
    text
}

fn generate_document_xml(paragraphs: usize) -> String {
    let mut xml = String::from("<w:document xmlns:w=\"urn:w\"><w:body>");
    for i in 0..paragraphs {
        xml.push_str(&format!(
            "<w:p><w:r><w:t>Paragraph {i} of the body</w:t><w:tab/><w:t>tail</w:t></w:r></w:p>"
        ));
    }
    xml.push_str("</w:body></w:document>");
    xml
}

fn bench_normalize(c: &mut Criterion) {
    let text = generate_text(512);
    c.bench_function("normalize_512kb", |b| b.iter(|| black_box(normalize_whitespace(&text))));
}

fn bench_txt_upload(c: &mut Criterion) {
    let extractor = Extractor::new();
    let bytes = generate_text(1024).into_bytes();
    c.bench_function("extract_txt_1mb", |b| {
        b.iter(|| black_box(extractor.extract_upload("book.txt", &bytes).unwrap()))
    });
}

fn bench_docx_body(c: &mut Criterion) {
    let xml = generate_document_xml(5000);
    c.bench_function("docx_body_5000_paragraphs", |b| {
        b.iter(|| black_box(DocxParser::body_text(&xml).unwrap()))
    });
}

criterion_group!(benches, bench_normalize, bench_txt_upload, bench_docx_body);
criterion_main!(benches);
