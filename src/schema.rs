//! Parsed Package Schema Module
//!
//! This module defines the immutable schema tree that the XML parsing layer
//! produces from the package document, the navigation documents and the
//! synchronization documents. The content model in this crate consumes the
//! schema as already-parsed data: nothing here reads the archive, and all
//! types are plain, cheaply-walkable values.

use indexmap::IndexMap;

use crate::overlay::NarrationTimestamp;

#[derive(Debug, PartialEq, Eq)]
pub enum EpubVersion {
    Version2_0,
    Version3_0,
}

/// Represents a metadata item in the EPUB publication
///
/// The `MetadataItem` structure represents a single piece of metadata from
/// the publication: title, author, identifier, language, and other
/// descriptive information. Meta elements from the OPF namespace are parsed
/// into the same shape, with the meta name as the property.
#[derive(Debug, Clone)]
pub struct MetadataItem {
    /// Optional unique identifier for this metadata item
    pub id: Option<String>,

    /// The metadata property name
    ///
    /// This field specifies the type of metadata this item represents. Common
    /// properties include "title", "creator", "identifier", "language", etc.
    /// These typically correspond to Dublin Core metadata terms.
    pub property: String,

    /// The metadata value
    pub value: String,

    /// Optional language code for this metadata item
    pub lang: Option<String>,

    /// Refinements of this metadata item
    ///
    /// In EPUB 3.x, metadata items can have associated refinements that
    /// provide additional information about the main metadata item, such as
    /// a creator's role or file-as form. In EPUB 2.x, custom attributes are
    /// parsed into the same shape.
    pub refined: Vec<MetadataRefinement>,
}

/// Represents a refinement of a metadata item
///
/// A refinement provides additional detail about a parent metadata item,
/// such as the scheme of an identifier or the role of a creator.
#[derive(Debug, Clone)]
pub struct MetadataRefinement {
    /// The refinement property name
    pub property: String,

    /// The refinement value
    pub value: String,

    /// Optional scheme identifier for this refinement
    pub scheme: Option<String>,
}

/// Represents a resource item declared in the EPUB manifest
///
/// Each manifest item describes one resource of the publication: its
/// location, declared media type, and optional property markers such as
/// `cover-image` or `nav`. Resources not listed in the manifest are not
/// part of the publication and never receive a content reference.
#[derive(Debug, Clone)]
pub struct ManifestItem {
    /// The location of the resource
    ///
    /// Either a path relative to the directory of the package document, or
    /// an absolute URL for resources hosted outside the container.
    pub href: String,

    /// The declared media type of the resource
    pub mime: String,

    /// Optional properties associated with this resource
    ///
    /// A space-separated list of property markers. The `cover-image` and
    /// `nav` markers single out the cover resource and the EPUB 3
    /// navigation document.
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Checks whether this item carries the given property marker.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties
            .as_ref()
            .is_some_and(|properties| properties.split_whitespace().any(|value| value == name))
    }
}

/// Represents an item in the EPUB spine, defining the reading order of the publication
///
/// Each spine item references a resource declared in the manifest and
/// indicates whether it belongs to the linear reading sequence. Non-linear
/// items represent supplementary content that is reached out of sequence.
#[derive(Debug)]
pub struct SpineItem {
    /// The ID reference to a manifest item
    pub idref: String,

    /// Optional identifier for this spine item
    pub id: Option<String>,

    /// Optional properties associated with this spine item
    pub properties: Option<String>,

    /// Indicates whether this item is part of the linear reading order
    pub linear: bool,
}

/// Represents a reference in the legacy guide section
///
/// The guide maps structural roles (cover, table of contents, preface) to
/// content documents. It is exposed as plain data for callers that still
/// consume it.
#[derive(Debug, Clone)]
pub struct GuideReference {
    /// The structural role of the referenced document, e.g. "cover" or "toc"
    pub kind: String,

    /// Optional display title of the reference
    pub title: Option<String>,

    /// The location of the referenced document
    pub href: String,
}

/// Represents a navigation point in the legacy navigation map
///
/// The `NavPoint` structure represents a single entry in the hierarchical
/// table of contents parsed from an NCX document. Each navigation point may
/// contain nested child navigation points to represent sub-sections.
#[derive(Debug, Eq, Clone)]
pub struct NavPoint {
    /// The display label/title of this navigation point
    pub label: String,

    /// The content document source this navigation point references
    ///
    /// Can be `None` for navigation points that no relevant information was
    /// provided in the original data.
    pub content: Option<String>,

    /// Child navigation points (sub-sections)
    pub children: Vec<NavPoint>,

    /// The reading order position of this navigation point
    ///
    /// It can be `None` for navigation points that no relevant information
    /// was provided in the original data.
    pub play_order: Option<usize>,
}

impl Ord for NavPoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.play_order.cmp(&other.play_order)
    }
}

impl PartialOrd for NavPoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NavPoint {
    fn eq(&self, other: &Self) -> bool {
        self.play_order == other.play_order
    }
}

/// The legacy navigation map parsed from an NCX document
#[derive(Debug)]
pub struct NcxSchema {
    /// The location of the NCX document, relative to the content root
    pub path: String,

    /// The document title declared in the NCX head
    pub title: String,

    /// The top-level navigation points, ordered by play order
    pub nav_map: Vec<NavPoint>,
}

/// The kind of a node in an EPUB 3 navigation section
#[derive(Debug, Clone)]
pub enum NavNodeKind {
    /// A link to a content document, optionally carrying a fragment
    Link { href: String },

    /// A non-linking label that groups its nested entries
    Header,
}

/// A single node of an EPUB 3 navigation section
#[derive(Debug, Clone)]
pub struct NavNode {
    /// Whether this node links to a document or only labels its children
    pub kind: NavNodeKind,

    /// The display text of this node
    pub label: String,

    /// Nested nodes (sub-sections)
    pub children: Vec<NavNode>,
}

/// A named section of the EPUB 3 navigation document
///
/// A navigation document contains one or more `nav` sections, each
/// identified by a structural semantics type such as "toc", "landmarks"
/// or "page-list".
#[derive(Debug)]
pub struct NavSection {
    /// The declared structural type of this section, e.g. "toc"
    pub kind: Option<String>,

    /// Optional heading of this section
    pub title: Option<String>,

    /// The recursive list of link/header nodes
    pub items: Vec<NavNode>,
}

/// The EPUB 3 navigation document
#[derive(Debug)]
pub struct NavDocument {
    /// The location of the navigation document, relative to the content root
    ///
    /// Hrefs inside the document resolve against this location's directory.
    pub path: String,

    /// The named sections of the document
    pub sections: Vec<NavSection>,
}

impl NavDocument {
    /// Returns the section navigation entries are built from.
    ///
    /// Prefers the section declared as "toc"; falls back to the first
    /// section when no type markers are present.
    pub fn toc_section(&self) -> Option<&NavSection> {
        self.sections
            .iter()
            .find(|section| section.kind.as_deref() == Some("toc"))
            .or_else(|| self.sections.first())
    }
}

/// An audio clip reference inside a synchronization document
#[derive(Debug, Clone)]
pub struct SmilAudioClip {
    /// The location of the audio resource
    pub src: String,

    /// The clip begin offset, parsed upstream from the SMIL clock value
    pub begin: Option<NarrationTimestamp>,

    /// The clip end offset, parsed upstream from the SMIL clock value
    pub end: Option<NarrationTimestamp>,
}

/// A parallel grouping pairing one text anchor with an optional audio clip
#[derive(Debug, Clone)]
pub struct SmilParallel {
    /// The text target, a document source with an optional fragment
    pub text_src: String,

    /// The audio clip narrated over the text target
    pub audio: Option<SmilAudioClip>,
}

/// A node of a synchronization document body
#[derive(Debug, Clone)]
pub enum SmilNode {
    /// An ordered sequence of nested nodes
    Sequence(Vec<SmilNode>),

    /// A text/audio pairing
    Parallel(SmilParallel),
}

/// A synchronization (media overlay) document
///
/// Synchronization documents pair text anchors with audio clip time ranges.
/// The walker that flattens them into narration phrases lives outside this
/// crate; the schema only carries the parsed grouping structure.
#[derive(Debug)]
pub struct SmilDocument {
    /// The location of the synchronization document, relative to the content root
    pub path: String,

    /// The top-level grouping nodes
    pub body: Vec<SmilNode>,
}

/// The complete parsed schema of one publication
///
/// `EpubSchema` aggregates everything the parsing layer extracts from the
/// package and navigation markup. It is handed to the book handle at
/// construction and never modified afterwards.
#[derive(Debug)]
pub struct EpubSchema {
    /// The EPUB version declared by the package document
    pub version: EpubVersion,

    /// Epub metadata extracted from the package document
    pub metadata: Vec<MetadataItem>,

    /// A list of resources contained inside the publication
    ///
    /// All resources in the publication are declared here, and undeclared
    /// resources should not be stored in the container.
    pub manifest: IndexMap<String, ManifestItem>,

    /// Physical reading order of the publication
    pub spine: Vec<SpineItem>,

    /// The legacy guide references
    pub guide: Vec<GuideReference>,

    /// The legacy navigation map, when an NCX document was present
    pub ncx: Option<NcxSchema>,

    /// The EPUB 3 navigation document, when one was present
    pub nav: Option<NavDocument>,

    /// The synchronization documents, in manifest order
    pub overlays: Vec<SmilDocument>,
}

impl EpubSchema {
    /// Retrieves the values of all metadata items with the given property
    ///
    /// # Parameters
    /// - `property`: The name of the metadata property to retrieve
    ///
    /// # Return
    /// - `Some(Vec<String>)`: A vector containing all matching metadata item values
    /// - `None`: If no matching metadata items are found
    pub fn metadata_values(&self, property: &str) -> Option<Vec<String>> {
        let values = self
            .metadata
            .iter()
            .filter(|item| item.property == property)
            .map(|item| item.value.clone())
            .collect::<Vec<String>>();

        (!values.is_empty()).then_some(values)
    }

    /// Retrieves the value of the first metadata item with the given property
    pub fn first_metadata_value(&self, property: &str) -> Option<String> {
        self.metadata
            .iter()
            .find(|item| item.property == property)
            .map(|item| item.value.clone())
    }
}

#[cfg(test)]
mod tests {
    mod navpoint_tests {
        use crate::schema::NavPoint;

        /// Testing the equality comparison of NavPoint
        #[test]
        fn test_navpoint_partial_eq() {
            let nav1 = NavPoint {
                label: "Chapter 1".to_string(),
                content: Some("chapter1.html".to_string()),
                children: vec![],
                play_order: Some(1),
            };

            let nav2 = NavPoint {
                label: "Chapter 1".to_string(),
                content: Some("chapter2.html".to_string()),
                children: vec![],
                play_order: Some(1),
            };

            let nav3 = NavPoint {
                label: "Chapter 2".to_string(),
                content: Some("chapter1.html".to_string()),
                children: vec![],
                play_order: Some(2),
            };

            assert_eq!(nav1, nav2); // Same play_order, different contents, should be equal
            assert_ne!(nav1, nav3); // Different play_order, Same contents, should be unequal
        }

        /// Test NavPoint sorting comparison
        #[test]
        fn test_navpoint_ord() {
            let nav1 = NavPoint {
                label: "Chapter 1".to_string(),
                content: Some("chapter1.html".to_string()),
                children: vec![],
                play_order: Some(1),
            };

            let nav2 = NavPoint {
                label: "Chapter 2".to_string(),
                content: Some("chapter2.html".to_string()),
                children: vec![],
                play_order: Some(2),
            };

            let nav3 = NavPoint {
                label: "Chapter 3".to_string(),
                content: Some("chapter3.html".to_string()),
                children: vec![],
                play_order: Some(3),
            };

            assert!(nav1 < nav2);
            assert!(nav2 > nav1);
            assert_eq!(nav1.partial_cmp(&nav2), Some(std::cmp::Ordering::Less));

            let mut nav_points = vec![nav2.clone(), nav3.clone(), nav1.clone()];
            nav_points.sort();
            assert_eq!(nav_points, vec![nav1, nav2, nav3]);
        }

        /// Test the case of None play_order
        #[test]
        fn test_navpoint_ord_with_none_play_order() {
            let nav_with_order = NavPoint {
                label: "Chapter 1".to_string(),
                content: Some("chapter1.html".to_string()),
                children: vec![],
                play_order: Some(1),
            };

            let nav_without_order = NavPoint {
                label: "Preface".to_string(),
                content: Some("preface.html".to_string()),
                children: vec![],
                play_order: None,
            };

            assert!(nav_without_order < nav_with_order);
            assert!(nav_with_order > nav_without_order);
        }
    }

    mod schema_tests {
        use indexmap::IndexMap;

        use crate::schema::{EpubSchema, EpubVersion, ManifestItem, MetadataItem};

        fn metadata_item(property: &str, value: &str) -> MetadataItem {
            MetadataItem {
                id: None,
                property: property.to_string(),
                value: value.to_string(),
                lang: None,
                refined: vec![],
            }
        }

        /// Test manifest property marker lookup
        #[test]
        fn test_manifest_item_has_property() {
            let item = ManifestItem {
                href: "cover.jpg".to_string(),
                mime: "image/jpeg".to_string(),
                properties: Some("cover-image remote-resources".to_string()),
            };

            assert!(item.has_property("cover-image"));
            assert!(item.has_property("remote-resources"));
            assert!(!item.has_property("nav"));
            assert!(!item.has_property("cover"));
        }

        /// Test metadata value retrieval in declaration order
        #[test]
        fn test_metadata_values() {
            let schema = EpubSchema {
                version: EpubVersion::Version3_0,
                metadata: vec![
                    metadata_item("title", "A Book"),
                    metadata_item("creator", "First Author"),
                    metadata_item("creator", "Second Author"),
                ],
                manifest: IndexMap::new(),
                spine: vec![],
                guide: vec![],
                ncx: None,
                nav: None,
                overlays: vec![],
            };

            assert_eq!(
                schema.metadata_values("creator"),
                Some(vec![
                    "First Author".to_string(),
                    "Second Author".to_string()
                ])
            );
            assert_eq!(
                schema.first_metadata_value("title"),
                Some("A Book".to_string())
            );
            assert_eq!(schema.metadata_values("description"), None);
        }
    }
}
