use std::future::Future;

use crate::error::{TripGeoError, UnsupportedFile};
use crate::options::SniffOptions;

type Result<T> = std::result::Result<T, TripGeoError>;

const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded file as the browser exposes it.
///
/// Reads suspend until the underlying I/O resolves.
pub trait TrackFile {
    /// Declared MIME type; empty when the browser could not guess one.
    fn content_type(&self) -> String;

    /// Bytes in `start..end`, clamped to the file length.
    fn read_range(&self, start: usize, end: usize) -> impl Future<Output = Result<Vec<u8>>>;

    /// Whole file decoded as UTF-8 text.
    fn read_text(&self) -> impl Future<Output = Result<String>>;

    /// Whole file as raw bytes.
    fn read_bytes(&self) -> impl Future<Output = Result<Vec<u8>>>;
}

/// How the declared content type says a file must be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// No declared type: sniff the leading bytes first.
    Untyped,
    Xml,
    Binary,
}

pub fn classify(content_type: &str, opts: &SniffOptions) -> std::result::Result<ContentKind, UnsupportedFile> {
    let content_type = content_type.trim();
    if content_type.is_empty() {
        Ok(ContentKind::Untyped)
    } else if opts.is_xml_content_type(content_type) {
        Ok(ContentKind::Xml)
    } else if content_type.eq_ignore_ascii_case(OCTET_STREAM) {
        Ok(ContentKind::Binary)
    } else {
        Err(UnsupportedFile::ContentType(content_type.to_string()))
    }
}

/// Read the file as document text according to its declared content type.
pub async fn read_track_document<F: TrackFile>(file: &F, opts: &SniffOptions) -> Result<String> {
    match classify(&file.content_type(), opts)? {
        ContentKind::Untyped => {
            let prefix = file.read_range(0, opts.sniff_bytes).await?;
            if !opts.looks_like_gpx(&String::from_utf8_lossy(&prefix)) {
                return Err(UnsupportedFile::NotGpx.into());
            }
            file.read_text().await
        }
        ContentKind::Xml => file.read_text().await,
        ContentKind::Binary => {
            let bytes = file.read_bytes().await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// A track file already held in memory.
#[derive(Debug, Clone)]
pub struct BytesTrackFile {
    content_type: String,
    bytes: Vec<u8>,
}

impl BytesTrackFile {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

impl TrackFile for BytesTrackFile {
    fn content_type(&self) -> String {
        self.content_type.clone()
    }

    async fn read_range(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        let end = end.min(self.bytes.len());
        let start = start.min(end);
        Ok(self.bytes[start..end].to_vec())
    }

    async fn read_text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.bytes).into_owned())
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    /// Records every range read so tests can check how much was sniffed.
    struct RecordingFile {
        inner: BytesTrackFile,
        ranges: RefCell<Vec<(usize, usize)>>,
    }

    impl TrackFile for RecordingFile {
        fn content_type(&self) -> String {
            self.inner.content_type()
        }

        async fn read_range(&self, start: usize, end: usize) -> Result<Vec<u8>> {
            self.ranges.borrow_mut().push((start, end));
            self.inner.read_range(start, end).await
        }

        async fn read_text(&self) -> Result<String> {
            self.inner.read_text().await
        }

        async fn read_bytes(&self) -> Result<Vec<u8>> {
            self.inner.read_bytes().await
        }
    }

    const GPX: &str = r#"<?xml version="1.0"?><gpx version="1.1"><trk><trkseg><trkpt lat="1" lon="2"/></trkseg></trk></gpx>"#;

    #[test]
    fn test_classify() {
        let opts = SniffOptions::default();
        assert_eq!(classify("", &opts), Ok(ContentKind::Untyped));
        assert_eq!(classify("  ", &opts), Ok(ContentKind::Untyped));
        assert_eq!(classify("application/gpx+xml", &opts), Ok(ContentKind::Xml));
        assert_eq!(classify("application/octet-stream", &opts), Ok(ContentKind::Binary));
        assert_eq!(
            classify("image/png", &opts),
            Err(UnsupportedFile::ContentType("image/png".to_string()))
        );
    }

    #[test]
    fn test_untyped_file_sniffs_prefix() {
        let file = RecordingFile {
            inner: BytesTrackFile::new("", GPX),
            ranges: RefCell::new(Vec::new()),
        };
        let text = block_on(read_track_document(&file, &SniffOptions::default())).unwrap();
        assert_eq!(text, GPX);
        assert_eq!(*file.ranges.borrow(), vec![(0, 200)]);
    }

    #[test]
    fn test_untyped_non_xml_rejected() {
        let file = BytesTrackFile::new("", "lat,lon\n50.1,14.4\n");
        let err = block_on(read_track_document(&file, &SniffOptions::default())).unwrap_err();
        assert!(matches!(
            err,
            TripGeoError::UnsupportedFile(UnsupportedFile::NotGpx)
        ));
    }

    #[test]
    fn test_untyped_marker_beyond_sniff_window() {
        let padded = format!("<?xml version=\"1.0\"?>{}<gpx></gpx>", " ".repeat(300));
        let file = BytesTrackFile::new("", padded);
        assert!(block_on(read_track_document(&file, &SniffOptions::default())).is_err());

        let opts = SniffOptions {
            sniff_bytes: 1024,
            ..Default::default()
        };
        assert!(block_on(read_track_document(&file, &opts)).is_ok());
    }

    #[test]
    fn test_binary_decoded_as_utf8() {
        let file = BytesTrackFile::new("application/octet-stream", GPX.as_bytes().to_vec());
        let text = block_on(read_track_document(&file, &SniffOptions::default())).unwrap();
        assert_eq!(text, GPX);
    }

    #[test]
    fn test_read_range_clamps() {
        let file = BytesTrackFile::new("", "abc");
        assert_eq!(block_on(file.read_range(0, 200)).unwrap(), b"abc");
        assert_eq!(block_on(file.read_range(5, 10)).unwrap(), b"");
    }
}
