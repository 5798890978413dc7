use quick_xml::events::Event;
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, info};

use crate::error::{CollectError, Result};
use crate::net;

#[derive(Debug, Default, PartialEq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

#[derive(Clone, Copy)]
enum ListField {
    Key,
    Token,
    Truncated,
}

/// Last object key under `prefix` (one level, `/` delimited) after `start_after`.
///
/// `start_after` keeps the listing from walking the bucket from the beginning.
pub fn latest_key(
    client: &Client,
    endpoint: &str,
    prefix: &str,
    start_after: &str,
) -> Result<Option<String>> {
    let mut latest = None;
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let url = list_url(endpoint, prefix, start_after, token.as_deref())?;
        let body = net::get_text(client, url.as_str())?;
        let page = parse_list_page(&body)?;
        pages += 1;
        debug!(page = pages, keys = page.keys.len(), "S3 listing page");

        if let Some(last) = page.keys.into_iter().last() {
            latest = Some(last);
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    info!("Listed {} page(s) under {}, latest: {:?}", pages, prefix, latest);
    Ok(latest)
}

fn list_url(endpoint: &str, prefix: &str, start_after: &str, token: Option<&str>) -> Result<Url> {
    let mut params = vec![
        ("list-type", "2"),
        ("prefix", prefix),
        ("delimiter", "/"),
        ("start-after", start_after),
    ];
    if let Some(t) = token {
        params.push(("continuation-token", t));
    }
    Url::parse_with_params(endpoint, &params)
        .map_err(|e| CollectError::InvalidUrl(format!("{}: {}", endpoint, e)))
}

/// Parse one ListObjectsV2 result page.
pub fn parse_list_page(xml: &str) -> Result<ListPage> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut page = ListPage::default();
    let mut truncated = false;
    let mut in_contents = false;
    let mut field: Option<ListField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"Contents" => in_contents = true,
                b"Key" if in_contents => field = Some(ListField::Key),
                b"NextContinuationToken" => field = Some(ListField::Token),
                b"IsTruncated" => field = Some(ListField::Truncated),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(f) = field {
                    let text = e
                        .unescape()
                        .map_err(|e| CollectError::Listing(e.to_string()))?
                        .into_owned();
                    match f {
                        ListField::Key => page.keys.push(text),
                        ListField::Token => page.next_token = Some(text),
                        ListField::Truncated => truncated = text.trim() == "true",
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Contents" {
                    in_contents = false;
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CollectError::Listing(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !truncated {
        page.next_token = None;
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRUNCATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>nix-releases</Name>
  <Prefix>nixpkgs/</Prefix>
  <KeyCount>2</KeyCount>
  <MaxKeys>2</MaxKeys>
  <Delimiter>/</Delimiter>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>nixpkgs/nixpkgs-25.05pre750000.aaaaaaaaaaaa</Key>
    <LastModified>2025-01-02T00:00:00.000Z</LastModified>
    <Size>0</Size>
  </Contents>
  <Contents>
    <Key>nixpkgs/nixpkgs-25.05pre751000.bbbbbbbbbbbb</Key>
    <Size>0</Size>
  </Contents>
  <CommonPrefixes><Prefix>nixpkgs/nixpkgs-25.05pre751000.bbbbbbbbbbbb/</Prefix></CommonPrefixes>
  <NextContinuationToken>1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=</NextContinuationToken>
  <StartAfter>nixpkgs/nixpkgs-25.05pre747523.95ea544c84eb</StartAfter>
</ListBucketResult>"#;

    #[test]
    fn truncated_page() {
        let page = parse_list_page(TRUNCATED).unwrap();
        assert_eq!(
            page.keys,
            vec![
                "nixpkgs/nixpkgs-25.05pre750000.aaaaaaaaaaaa",
                "nixpkgs/nixpkgs-25.05pre751000.bbbbbbbbbbbb"
            ]
        );
        assert_eq!(
            page.next_token.as_deref(),
            Some("1ueGcxLPRx1Tr/XYExHnhbYLgveDs2J/wm36Hy4vbOwM=")
        );
    }

    #[test]
    fn last_page_has_no_token() {
        let xml = r#"<ListBucketResult>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>nixos/unstable/nixos-25.11pre1.abc</Key></Contents>
</ListBucketResult>"#;
        let page = parse_list_page(xml).unwrap();
        assert_eq!(page.keys, vec!["nixos/unstable/nixos-25.11pre1.abc"]);
        assert_eq!(page.next_token, None);
    }

    #[test]
    fn prefixes_and_other_fields_are_not_keys() {
        let xml = r#"<ListBucketResult>
  <Prefix>nixpkgs/</Prefix>
  <IsTruncated>false</IsTruncated>
  <CommonPrefixes><Prefix>nixpkgs/x/</Prefix></CommonPrefixes>
</ListBucketResult>"#;
        assert_eq!(parse_list_page(xml).unwrap(), ListPage::default());
    }

    #[test]
    fn escaped_keys_are_unescaped() {
        let xml = "<ListBucketResult><Contents><Key>a&amp;b</Key></Contents></ListBucketResult>";
        assert_eq!(parse_list_page(xml).unwrap().keys, vec!["a&b"]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let xml = "<ListBucketResult><Contents><Key>a</Contents>";
        assert!(matches!(parse_list_page(xml), Err(CollectError::Listing(_))));
    }

    #[test]
    fn list_url_params() {
        let url = list_url(
            "https://nix-releases.s3.eu-west-1.amazonaws.com",
            "nixpkgs/",
            "nixpkgs/nixpkgs-25.05pre747523.95ea544c84eb",
            Some("tok=="),
        )
        .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("list-type".into(), "2".into())));
        assert!(pairs.contains(&("prefix".into(), "nixpkgs/".into())));
        assert!(pairs.contains(&("delimiter".into(), "/".into())));
        assert!(pairs.contains(&("continuation-token".into(), "tok==".into())));
        assert_eq!(url.host_str(), Some("nix-releases.s3.eu-west-1.amazonaws.com"));
    }
}
