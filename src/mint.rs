//! Identifier minting and URI validation
//!
//! Every external token that enters the engine — record keys, field names,
//! entity names — either already is an absolute URI or gets one minted here.
//! Minting is deterministic for a given input: the only random component is
//! the UUID fallback for records that arrive without a usable key.

use crate::schema::DataModelId;
use url::Url;
use uuid::Uuid;

/// Base namespace used when the caller does not supply one.
pub const DEFAULT_BASE_URI: &str = "http://data.weft.org/";

/// The rdf:type predicate URI.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Suffix appended to a term URI to derive the type URI of its entities.
pub const TYPE_SUFFIX: &str = "Type";

const HASH: char = '#';
const SLASH: char = '/';
const AT: char = '@';

/// Whether a token already parses as an absolute URI with a scheme.
///
/// Parse failures (relative references, garbage, empty input) are `false`;
/// this never fails.
pub fn is_absolute_uri(token: &str) -> bool {
    Url::parse(token).is_ok()
}

/// Escape a local name the way form parameters are escaped.
fn escape(local_name: &str) -> String {
    url::form_urlencoded::byte_serialize(local_name.as_bytes()).collect()
}

/// Append a local name to a base namespace.
///
/// Slash namespaces keep their shape; every other base becomes a hash URI.
/// A leading `#` or `@` on the local name is stripped under a slash base so
/// markup attribute names don't leak their sigils into minted URIs.
pub fn mint_uri(base: &str, local_name: &str) -> String {
    if base.ends_with(SLASH) {
        let local = local_name
            .strip_prefix(HASH)
            .or_else(|| local_name.strip_prefix(AT))
            .unwrap_or(local_name);
        return format!("{}{}", base, escape(local));
    }

    if local_name.starts_with(HASH) {
        return format!("{}{}", base, local_name);
    }

    if base.ends_with(HASH) {
        return format!("{}{}", base, escape(local_name));
    }

    format!("{}{}{}", base, HASH, escape(local_name))
}

/// Mint a term URI for a (possibly sigil-prefixed) local name.
///
/// A local name that is itself an absolute URI is returned unchanged.
pub fn mint_term_uri(local_name: &str, base: &str) -> String {
    let local = local_name.strip_prefix(AT).unwrap_or(local_name);

    if is_absolute_uri(local) {
        return local.to_string();
    }

    mint_uri(base, local)
}

/// Base URI of a data model: `<base>datamodels/<id>`.
pub fn data_model_base_uri(data_model: &DataModelId, base: &str) -> String {
    let sep = if base.ends_with(SLASH) { "" } else { "/" };
    format!("{}{}datamodels/{}", base, sep, data_model)
}

/// Namespace for terms minted within a data model's schema:
/// `<base>datamodels/<id>/schema#`.
pub fn data_model_schema_uri(data_model: &DataModelId, base: &str) -> String {
    format!("{}/schema#", data_model_base_uri(data_model, base))
}

/// Namespace key under which a data model's graphs are stored:
/// `<base>datamodels/<id>/data`.
pub fn data_model_graph_uri(data_model: &DataModelId, base: &str) -> String {
    format!("{}/data", data_model_base_uri(data_model, base))
}

/// Mint a record URI from an optional external key.
///
/// With a data model the URI is scoped under it; a missing or empty key
/// falls back to a random UUID suffix. For a present, non-empty key the
/// result is fully deterministic, so statements emitted before the record
/// closes all agree on the subject.
pub fn mint_record_uri(
    external_key: Option<&str>,
    data_model: Option<&DataModelId>,
    base: &str,
) -> String {
    let records_base = match data_model {
        Some(dm) => format!("{}/records/", data_model_base_uri(dm, base)),
        None => {
            let sep = if base.ends_with(SLASH) { "" } else { "/" };
            format!("{}{}records/", base, sep)
        }
    };

    match external_key {
        Some(key) if !key.is_empty() => format!("{}{}", records_base, key),
        _ => format!("{}{}", records_base, Uuid::new_v4()),
    }
}

/// Type URI for entities reached through a term: `<term_uri>Type`.
pub fn entity_type_uri(term_uri: &str) -> String {
    format!("{}{}", term_uri, TYPE_SUFFIX)
}

/// Human-readable name of a URI: the text after the last `#` or `/`.
///
/// URIs ending in a delimiter, and URIs without one, are returned whole.
pub fn last_uri_segment(uri: &str) -> &str {
    let cut = uri.rfind(HASH).or_else(|| uri.rfind(SLASH));

    match cut {
        Some(i) if i + 1 < uri.len() => &uri[i + 1..],
        _ => uri,
    }
}
