/*!
 * Anchoring: locating, validating and re-validating highlight ranges in
 * source text.
 *
 * A highlight is anchored by a byte range into the document's source text.
 * The range is produced once, at creation time, by resolving the pair
 * (selected text, occurrence index) against the current source, and is never
 * moved afterwards. Whenever the document is rendered the anchor is judged
 * again: a range that no longer matches its text is flagged stale, not
 * relocated.
 *
 * The occurrence scan in [`search`] advances by one character after each hit,
 * so overlapping matches count as distinct occurrences. The client-side
 * occurrence-index calculation ([`crate::selection`]) uses the same scan;
 * the two sides must agree on counting or disambiguation silently picks the
 * wrong occurrence.
 */

pub mod search;
pub mod stale;
pub mod validate;
