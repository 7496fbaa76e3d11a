// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Grouping of captured entries into one document per endpoint.

use crate::document::{AggregateOptions, Document};
use crate::entry::{Entry, Fingerprint};
use crate::helpers::headers::header_values;
use crate::score::PromotedValue;
use hyper::HeaderMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Partition `entries` by fingerprint and fold each partition into a
/// `Document`.
///
/// Documents come back in fingerprint order; the call has no side effects
/// and returns the same documents for the same entries.
pub fn aggregate(entries: &[Entry], options: &AggregateOptions) -> Vec<Document> {
    let mut groups: BTreeMap<Fingerprint, Vec<&Entry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.fingerprint()).or_default().push(entry);
    }

    debug!(
        entries = entries.len(),
        groups = groups.len(),
        "grouped captured entries"
    );

    groups
        .into_values()
        .map(|group| fold(&group, options))
        .collect()
}

fn fold(entries: &[&Entry], options: &AggregateOptions) -> Document {
    let mut doc = Document::empty(options);

    for entry in entries {
        let normalized = entry.normalize();

        doc.method.add(entry.method.clone());
        doc.status.add(entry.status);
        doc.url.add(normalized.host_path.clone());

        doc.params.add(entry.query().into_iter().map(|(name, values)| {
            let promoted = normalized.is_promoted(&name);
            PromotedValue::new(name, values).promoted(promoted)
        }));

        doc.request_headers.add(header_samples(&entry.request_headers));
        doc.request_body.add(entry.request_body.clone());
        doc.response_headers.add(header_samples(&entry.response_headers));
        doc.response_body.add(entry.response_body.clone());
    }

    doc
}

fn header_samples(headers: &HeaderMap) -> impl Iterator<Item = PromotedValue> {
    header_values(headers)
        .into_iter()
        .map(|(name, values)| PromotedValue::new(name, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Values;
    use crate::test_helpers::{make_entry, make_headers_from_pairs};
    use bytes::Bytes;

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
            .collect()
    }

    #[test]
    fn empty_batch_yields_no_documents() {
        assert!(aggregate(&[], &AggregateOptions::default()).is_empty());
    }

    #[test]
    fn groups_by_method_path_and_status() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("GET", "/a", 200)?,
            make_entry("GET", "/a?x=1", 200)?,
            make_entry("POST", "/a", 200)?,
            make_entry("GET", "/b", 200)?,
            make_entry("GET", "/a", 404)?,
        ];
        let docs = aggregate(&entries, &AggregateOptions::default());
        assert_eq!(docs.len(), 4);

        let a_get = docs
            .iter()
            .find(|d| d.sort_key() == ("/a".to_string(), "GET".to_string(), 200))
            .expect("GET /a 200 document");
        assert_eq!(a_get.samples(), 2);
        Ok(())
    }

    #[test]
    fn status_groups_do_not_leak_into_each_other() -> anyhow::Result<()> {
        let ok_headers = make_headers_from_pairs(&[("x-ok", "1")])?;
        let missing_headers = make_headers_from_pairs(&[("x-missing", "1")])?;
        let entries = vec![
            make_entry("GET", "/item?id=1", 200)?.with_response_headers(ok_headers.clone()),
            make_entry("GET", "/item?id=1", 200)?.with_response_headers(ok_headers),
            make_entry("GET", "/item?id=2", 404)?.with_response_headers(missing_headers),
        ];
        let docs = aggregate(&entries, &AggregateOptions::default());
        assert_eq!(docs.len(), 2);

        let ok = docs
            .iter()
            .find(|d| d.status().majority().value == 200)
            .expect("200 document");
        let missing = docs
            .iter()
            .find(|d| d.status().majority().value == 404)
            .expect("404 document");

        assert_eq!(ok.params().canonical(), values(&[("id", "1")]));
        assert_eq!(ok.response_headers().canonical(), values(&[("X-Ok", "1")]));
        assert!(ok.params().variants().is_empty());

        assert_eq!(missing.params().canonical(), values(&[("id", "2")]));
        assert_eq!(
            missing.response_headers().canonical(),
            values(&[("X-Missing", "1")])
        );
        Ok(())
    }

    #[test]
    fn marker_parameters_template_the_path_and_are_promoted() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("GET", "/users/1?:id=1", 200)?,
            make_entry("GET", "/users/2?:id=2", 200)?,
            make_entry("GET", "/users/3?:id=3&verbose=true", 200)?,
        ];
        let docs = aggregate(&entries, &AggregateOptions::default());
        assert_eq!(docs.len(), 1);

        let doc = &docs[0];
        assert_eq!(doc.url().majority().value.to_string(), "/users/:id");
        assert_eq!(doc.url().majority().score, 1.0);

        let canonical = doc.params().canonical();
        assert_eq!(canonical.get(":id"), Some(&vec!["3".to_string()]));

        let variants = doc.params().variants();
        assert_eq!(variants.len(), 1);
        assert!(variants[0].values.contains_key("verbose"));
        Ok(())
    }

    #[test]
    fn request_and_response_headers_are_independent() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("GET", "/h", 200)?
                .with_request_headers(make_headers_from_pairs(&[("accept", "*/*")])?)
                .with_response_headers(make_headers_from_pairs(&[("accept", "nope")])?),
            make_entry("GET", "/h", 200)?
                .with_request_headers(make_headers_from_pairs(&[("accept", "*/*")])?),
        ];
        let docs = aggregate(&entries, &AggregateOptions::default());
        let doc = &docs[0];

        assert_eq!(doc.request_headers().canonical(), values(&[("Accept", "*/*")]));
        assert!(doc.response_headers().canonical().is_empty());
        assert_eq!(doc.response_headers().variants().len(), 1);
        Ok(())
    }

    #[test]
    fn bodies_vote_on_exact_bytes() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("POST", "/b", 201)?.with_response_body("{\"a\":1}"),
            make_entry("POST", "/b", 201)?.with_response_body("{\"a\":1}"),
            make_entry("POST", "/b", 201)?.with_response_body("{\"a\": 1}"),
        ];
        let docs = aggregate(&entries, &AggregateOptions::default());
        let body = docs[0].response_body();
        assert_eq!(body.majority().value, Bytes::from_static(b"{\"a\":1}"));
        assert_eq!(body.minorities().len(), 1);
        assert!(docs[0].request_body().majority().value.is_empty());
        Ok(())
    }

    #[test]
    fn options_reach_the_keyed_aggregators() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("GET", "/t?a=1", 200)?,
            make_entry("GET", "/t?a=1", 200)?,
            make_entry("GET", "/t", 200)?,
        ];
        let strict = aggregate(&entries, &AggregateOptions::default());
        assert!(strict[0].params().canonical().is_empty());

        let relaxed = aggregate(
            &entries,
            &AggregateOptions {
                threshold: 0.5,
                merge_duplicates: false,
            },
        );
        assert_eq!(relaxed[0].params().canonical(), values(&[("a", "1")]));
        Ok(())
    }

    #[test]
    fn aggregate_is_deterministic() -> anyhow::Result<()> {
        let entries = vec![
            make_entry("GET", "/x?p=1", 200)?,
            make_entry("GET", "/x?p=2", 200)?,
            make_entry("GET", "/y", 200)?,
        ];
        let first = aggregate(&entries, &AggregateOptions::default());
        let second = aggregate(&entries, &AggregateOptions::default());
        let keys = |docs: &[Document]| docs.iter().map(|d| d.sort_key()).collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(first[0].params().variants(), second[0].params().variants());
        Ok(())
    }
}
