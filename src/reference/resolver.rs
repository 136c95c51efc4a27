use super::{
    DocumentFetcher, DocumentStore, Hop, Pointer, ReferenceOrigin, Resolvable, Resolved,
    Terminal,
};
use crate::diagnostics::{Diagnostic, Rule};
use crate::document::RawDocument;
use crate::error::Error;
use crate::pointer;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Context a pointer is resolved in
#[derive(Clone)]
pub struct ResolveOptions {
    /// The document the build started from
    pub root_document: Arc<RawDocument>,
    /// The document the pointer being resolved was found in
    pub target_document: Arc<RawDocument>,
    /// Location relative pointers are resolved against
    pub target_location: String,
    pub disable_external_refs: bool,
    pub fetcher: Option<Arc<dyn DocumentFetcher>>,
    pub store: Arc<DocumentStore>,
    pub cancellation: CancellationToken,
}

impl ResolveOptions {
    #[must_use]
    pub fn new(root_document: Arc<RawDocument>) -> Self {
        let store = Arc::new(DocumentStore::new());
        store.insert(Arc::clone(&root_document));
        Self {
            target_location: root_document.location().to_string(),
            target_document: Arc::clone(&root_document),
            root_document,
            disable_external_refs: false,
            fetcher: None,
            store,
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub const fn with_external_refs_disabled(mut self, disabled: bool) -> Self {
        self.disable_external_refs = disabled;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Shares a store with other builds, e.g. to resolve several root documents that
    /// reference the same shared files
    #[must_use]
    pub fn with_store(mut self, store: Arc<DocumentStore>) -> Self {
        store.insert(Arc::clone(&self.root_document));
        self.store = store;
        self
    }

    /// The same options, resolving relative to `document`
    #[must_use]
    pub fn for_document(&self, document: Arc<RawDocument>) -> Self {
        Self {
            target_location: document.location().to_string(),
            target_document: document,
            ..self.clone()
        }
    }

    fn document_at(&self, location: &str, raw: &str) -> Result<Arc<RawDocument>, Error> {
        if location == self.target_document.location() {
            return Ok(Arc::clone(&self.target_document));
        }
        if location == self.root_document.location() {
            return Ok(Arc::clone(&self.root_document));
        }
        if self.disable_external_refs {
            return Err(Error::external_refs_disabled(raw));
        }
        self.store.document(location, self.fetcher.as_deref())
    }
}

impl fmt::Debug for ResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveOptions")
            .field("root_document", &self.root_document.location())
            .field("target_location", &self.target_location)
            .field("disable_external_refs", &self.disable_external_refs)
            .field("has_fetcher", &self.fetcher.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Resolvable> Pointer<T> {
    /// Resolves the pointer, following chains of pointers across documents.
    ///
    /// The first successful or circular outcome is cached on this pointer; later calls,
    /// from any thread, return the cached outcome without resolving again.
    ///
    /// # Errors
    ///
    /// - `CircularReference` when the chain returns to a location it already visited
    /// - `Pointer` for a malformed `$ref` string
    /// - `Reference` when nothing usable is found at the target
    /// - `ExternalReference` when another document is needed and cannot be had
    /// - `Cancelled` when the options' token was cancelled first
    pub fn resolve(&self, options: &ResolveOptions) -> Result<&Resolved<T>, Error> {
        let terminal = self
            .cache
            .get_or_try_init(|| self.compute(options, Vec::new(), None))?;
        match terminal {
            Terminal::Resolved(resolved) => Ok(resolved),
            Terminal::Circular(chain) => Err(Error::circular_reference(chain)),
        }
    }

    /// `origin` is the pointer that started the chain, `None` for the first pointer
    fn compute(
        &self,
        options: &ResolveOptions,
        mut chain: Vec<String>,
        origin: Option<ReferenceOrigin>,
    ) -> Result<Terminal<T>, Error> {
        if options.cancellation.is_cancelled() {
            return Err(Error::cancelled());
        }

        let parsed = pointer::parse_reference(&self.raw)?;
        let document_location = match &parsed.document {
            None => options.target_location.clone(),
            Some(document) => pointer::join_location(&options.target_location, document)?,
        };
        let location = pointer::absolute_location(&document_location, &parsed.segments);

        if chain.contains(&location) {
            chain.push(location);
            debug!(
                target: "refscope::reference",
                chain = %chain.join(" → "),
                "circular reference"
            );
            return Ok(Terminal::Circular(chain));
        }
        chain.push(location.clone());
        trace!(target: "refscope::reference", reference = %self.raw, %location, "following reference");

        let document = options.document_at(&document_location, &self.raw)?;
        let Some(value) = pointer::lookup(document.value(), &parsed.segments) else {
            let reason = pointer::explain_lookup_failure(document.value(), &parsed.segments)
                .unwrap_or_else(|| format!("nothing found at '{location}'"));
            return Err(Error::unresolvable_reference(&self.raw, reason));
        };

        if let Some(next) = value.as_object().and_then(Self::from_object) {
            return self.follow(next, options, document, location, chain, origin);
        }

        let object = options
            .store
            .target::<T>(&location, value)
            .map_err(|reason| {
                Error::unresolvable_reference(
                    &self.raw,
                    format!("target is not a valid {}: {reason}", T::KIND),
                )
            })?;

        Ok(Terminal::Resolved(Resolved {
            object,
            document,
            location,
            segments: parsed.segments,
            chain,
            hops: Vec::new(),
            diagnostics: Vec::new(),
        }))
    }

    /// Continues through an intermediate `$ref` found at `location`
    fn follow(
        &self,
        next: Self,
        options: &ResolveOptions,
        document: Arc<RawDocument>,
        location: String,
        chain: Vec<String>,
        origin: Option<ReferenceOrigin>,
    ) -> Result<Terminal<T>, Error> {
        let here = ReferenceOrigin {
            raw: self.raw.clone(),
            target: location.clone(),
        };
        let top_level_parent = origin.unwrap_or_else(|| here.clone());
        let hop = Hop {
            raw: next.raw.clone(),
            location: location.clone(),
            parent: here,
            top_level_parent: top_level_parent.clone(),
        };

        let mut diagnostics = Vec::new();
        if !next.ignored_siblings.is_empty() {
            let fragment = location.split_once('#').map_or("", |(_, f)| f);
            diagnostics.push(
                Diagnostic::new(
                    Rule::RefSiblingsIgnored,
                    location.clone(),
                    format!(
                        "properties next to '$ref' are ignored: {}",
                        next.ignored_siblings.join(", ")
                    ),
                )
                .with_position(document.position(fragment)),
            );
        }

        let next_options = options.for_document(document);
        Ok(match next.compute(&next_options, chain, Some(top_level_parent))? {
            Terminal::Circular(chain) => Terminal::Circular(chain),
            Terminal::Resolved(mut resolved) => {
                resolved.hops.insert(0, hop);
                diagnostics.append(&mut resolved.diagnostics);
                resolved.diagnostics = diagnostics;
                Terminal::Resolved(resolved)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Parameter, Schema};
    use crate::error::ErrorKind;
    use crate::reference::{MockDocumentFetcher, ResolutionState};
    use serde_json::json;

    fn options(value: serde_json::Value) -> ResolveOptions {
        ResolveOptions::new(Arc::new(RawDocument::new("api.json", value)))
    }

    #[test]
    fn test_resolves_local_pointer() {
        let opts = options(json!({"components": {"schemas": {"Pet": {"type": "object"}}}}));
        let pointer = Pointer::<Schema>::new("#/components/schemas/Pet");
        let resolved = pointer.resolve(&opts).unwrap();
        assert_eq!(resolved.location(), "api.json#/components/schemas/Pet");
        assert!(resolved.object().as_object().is_some());
        assert_eq!(pointer.state(), ResolutionState::Resolved);
    }

    #[test]
    fn test_chain_records_parents() {
        let opts = options(json!({"components": {"schemas": {
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/C", "type": "object"},
            "C": {"type": "string"}
        }}}));
        let pointer = Pointer::<Schema>::new("#/components/schemas/A");
        let resolved = pointer.resolve(&opts).unwrap();
        assert_eq!(resolved.location(), "api.json#/components/schemas/C");
        assert_eq!(resolved.chain().len(), 3);
        let hops = resolved.hops();
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].raw, "#/components/schemas/B");
        assert_eq!(hops[0].parent.raw, "#/components/schemas/A");
        assert_eq!(hops[1].parent.raw, "#/components/schemas/B");
        assert_eq!(hops[1].top_level_parent.raw, "#/components/schemas/A");
        assert_eq!(resolved.diagnostics().len(), 1);
        assert_eq!(resolved.diagnostics()[0].rule, Rule::RefSiblingsIgnored);
    }

    #[test]
    fn test_hops_name_the_pointer_that_started_each_chain() {
        let opts = options(json!({"components": {"schemas": {
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/C"},
            "C": {"$ref": "#/components/schemas/D"},
            "D": {"type": "string"}
        }}}));
        let from_a = Pointer::<Schema>::new("#/components/schemas/A");
        let hops = from_a.resolve(&opts).unwrap().hops();
        assert_eq!(hops.len(), 3);
        assert!(hops.iter().all(|hop| hop.top_level_parent.raw == "#/components/schemas/A"));
        assert_eq!(hops[2].parent.target, "api.json#/components/schemas/C");

        // a chain entered halfway starts from its own pointer
        let from_b = Pointer::<Schema>::new("#/components/schemas/B");
        let hops = from_b.resolve(&opts).unwrap().hops();
        assert_eq!(hops.len(), 2);
        assert!(hops.iter().all(|hop| hop.top_level_parent.raw == "#/components/schemas/B"));
    }

    #[test]
    fn test_two_hop_cycle_is_cached() {
        let opts = options(json!({"components": {"schemas": {
            "A": {"$ref": "#/components/schemas/B"},
            "B": {"$ref": "#/components/schemas/A"}
        }}}));
        let pointer = Pointer::<Schema>::new("#/components/schemas/A");
        let err = pointer.resolve(&opts).unwrap_err();
        assert!(err.is_circular());
        assert!(err.to_string().contains("circular reference detected"));
        assert_eq!(pointer.state(), ResolutionState::Circular);
        assert_eq!(
            pointer.circular_chain().unwrap(),
            [
                "api.json#/components/schemas/A",
                "api.json#/components/schemas/B",
                "api.json#/components/schemas/A"
            ]
        );
        assert!(pointer.resolve(&opts).unwrap_err().is_circular());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let opts = options(json!({}));
        let pointer = Pointer::<Schema>::new("#/components/schemas/Missing");
        let err = pointer.resolve(&opts).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Reference));
        assert_eq!(pointer.state(), ResolutionState::Unresolved);
    }

    #[test]
    fn test_unescaped_slash_hint() {
        let opts = options(json!({"paths": {"/pets": {"parameters": [{"name": "id", "in": "query"}]}}}));
        let pointer = Pointer::<Parameter>::new("#/paths//pets/parameters/0");
        let err = pointer.resolve(&opts).unwrap_err();
        assert!(err.to_string().contains("~1pets"), "{err}");
    }

    #[test]
    fn test_wrong_target_type() {
        let opts = options(json!({"components": {"parameters": {"P": {"name": 5}}}}));
        let pointer = Pointer::<Parameter>::new("#/components/parameters/P");
        let err = pointer.resolve(&opts).unwrap_err();
        assert!(err.to_string().contains("target is not a valid parameter"));
    }

    #[test]
    fn test_external_refs_disabled() {
        let opts = options(json!({})).with_external_refs_disabled(true);
        let pointer = Pointer::<Schema>::new("common.json#/Pet");
        let err = pointer.resolve(&opts).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ExternalReference));
    }

    #[test]
    fn test_external_chain_switches_document() {
        let mut fetcher = MockDocumentFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|location| location == "shared/pet.json")
            .times(1)
            .returning(|_| Ok(r##"{"Pet": {"$ref": "#/Base"}, "Base": {"type": "object"}}"##.to_string()));
        let opts = options(json!({})).with_fetcher(Arc::new(fetcher));
        let pointer = Pointer::<Schema>::new("shared/pet.json#/Pet");
        let resolved = pointer.resolve(&opts).unwrap();
        assert_eq!(resolved.location(), "shared/pet.json#/Base");
        assert_eq!(resolved.document().location(), "shared/pet.json");
    }

    #[test]
    fn test_cancelled_resolution_leaves_cache_empty() {
        let token = CancellationToken::new();
        token.cancel();
        let opts = options(json!({"S": {"type": "string"}})).with_cancellation(token);
        let pointer = Pointer::<Schema>::new("#/S");
        assert!(pointer.resolve(&opts).unwrap_err().is_cancelled());
        assert_eq!(pointer.state(), ResolutionState::Unresolved);
    }
}
