use std::io::Write;

use novelsum_core::{PdfBackend, extract_text_from_bytes};
use novelsum_pdf_mupdf::MupdfBackend;

/// Build a small PDF with one page per entry. `None` pages have no content
/// stream. Text pages draw each line in Helvetica, top to bottom.
fn build_pdf(pages: &[Option<&[&str]>]) -> Vec<u8> {
    let n = pages.len();
    // 1: catalog, 2: pages, 3: font, then (page, content) pairs
    let page_id = |i: usize| 4 + 2 * i;
    let content_id = |i: usize| 5 + 2 * i;

    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", page_id(i))).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        n
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (i, page) in pages.iter().enumerate() {
        match page {
            Some(lines) => {
                objects.push(format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                     /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                    content_id(i)
                ));
                let mut stream = String::from("BT /F1 12 Tf 72 700 Td 16 TL\n");
                for line in *lines {
                    stream.push_str(&format!("({line}) Tj T*\n"));
                }
                stream.push_str("ET");
                objects.push(format!(
                    "<< /Length {} >>\nstream\n{}\nendstream",
                    stream.len(),
                    stream
                ));
            }
            None => {
                objects.push(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string(),
                );
                // Keep object numbering dense.
                objects.push("<< >>".to_string());
            }
        }
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body).unwrap();
    }
    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).unwrap();
    for off in offsets {
        write!(out, "{off:010} 00000 n \n").unwrap();
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    )
    .unwrap();
    out
}

#[test]
fn test_extracts_text_in_page_order() {
    let pdf = build_pdf(&[
        Some(&["Chapter One", "The ship left port at dawn."]),
        Some(&["Chapter Two", "A storm rose in the night."]),
    ]);
    let doc = extract_text_from_bytes("voyage.pdf", &pdf, &MupdfBackend::new()).unwrap();

    assert_eq!(doc.pages, 2);
    assert!(!doc.is_empty());
    let first = doc.text.find("The ship left port").unwrap();
    let second = doc.text.find("A storm rose").unwrap();
    assert!(first < second);
    assert!(doc.text.contains("Chapter One"));
}

#[test]
fn test_pages_match_backend_output() {
    let pdf = build_pdf(&[Some(&["Alpha"]), Some(&["Beta"])]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two.pdf");
    std::fs::write(&path, &pdf).unwrap();

    let pages = MupdfBackend::new().extract_pages(&path).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Alpha"));
    assert!(pages[1].contains("Beta"));

    let doc = extract_text_from_bytes("two.pdf", &pdf, &MupdfBackend::new()).unwrap();
    assert_eq!(doc.text, pages.concat());
}

#[test]
fn test_page_without_text_is_empty_not_error() {
    let pdf = build_pdf(&[None]);
    let doc = extract_text_from_bytes("scan.pdf", &pdf, &MupdfBackend::new()).unwrap();
    assert_eq!(doc.pages, 1);
    assert!(doc.is_empty());
}

#[test]
fn test_header_exclusion_drops_top_block() {
    // The only block sits near the top of the page.
    let pdf = build_pdf(&[Some(&["Running Header"])]);
    let backend = MupdfBackend::new().with_header_exclusion(0.2);
    let doc = extract_text_from_bytes("h.pdf", &pdf, &backend).unwrap();
    assert!(!doc.text.contains("Running Header"));
}

#[test]
fn test_garbage_is_open_error() {
    let err = extract_text_from_bytes("junk.pdf", b"not a pdf at all", &MupdfBackend::new());
    assert!(err.is_err());
}
