//! Schema contract - the only collections and fields a query may touch

/// Description of one sanctioned collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Collection name as it exists in the data store
    pub name: &'static str,

    /// Short human-readable description, used in prompts
    pub description: &'static str,

    /// Field names available for filtering and projection
    pub fields: &'static [&'static str],
}

impl CollectionSchema {
    /// Check whether a field path belongs to this collection
    ///
    /// Dotted paths (`education.school`) are checked by their first segment.
    pub fn has_field(&self, path: &str) -> bool {
        let root = path.split('.').next().unwrap_or(path);
        self.fields.contains(&root)
    }
}

/// The static, read-only description of what the pipeline may query
///
/// The contract is process-wide and never mutated. The translator is told
/// about it through its prompt, and the gatekeeper re-checks every
/// descriptor against it before anything reaches the store.
///
/// # Examples
///
/// ```
/// use docent_domain::SchemaContract;
///
/// let contract = SchemaContract::standard();
/// assert!(contract.contains_collection("teams"));
/// assert!(contract.has_field("careers", "pay type"));
/// assert!(!contract.contains_collection("users"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaContract {
    collections: &'static [CollectionSchema],
}

const TEAMS: CollectionSchema = CollectionSchema {
    name: "teams",
    description: "Attorneys and staff of each firm",
    fields: &[
        "_id",
        "name",
        "position",
        "firm",
        "about",
        "achievements",
        "admissions",
        "education",
        "affiliations",
        "phone",
        "email",
    ],
};

const CAREERS: CollectionSchema = CollectionSchema {
    name: "careers",
    description: "Open job postings",
    fields: &[
        "_id",
        "position",
        "location",
        "firm",
        "experience",
        "compensation",
        "pay type",
        "description",
    ],
};

const ARTICLES: CollectionSchema = CollectionSchema {
    name: "articles",
    description: "Articles and insights published by the firms",
    fields: &["_id", "title", "area", "body", "firm", "author", "date"],
};

const PRACTICES: CollectionSchema = CollectionSchema {
    name: "practices",
    description: "Practice areas offered by each firm",
    fields: &[
        "_id",
        "title",
        "standardized_title",
        "firm",
        "specializations",
        "team members",
        "leaders",
    ],
};

static STANDARD_CONTRACT: SchemaContract = SchemaContract {
    collections: &[TEAMS, CAREERS, ARTICLES, PRACTICES],
};

impl SchemaContract {
    /// Build a contract over an arbitrary static set of collections
    pub const fn new(collections: &'static [CollectionSchema]) -> Self {
        Self { collections }
    }

    /// The firm directory contract: `teams`, `careers`, `articles`, `practices`
    pub fn standard() -> &'static SchemaContract {
        &STANDARD_CONTRACT
    }

    /// All collections in declaration order
    pub fn collections(&self) -> &'static [CollectionSchema] {
        self.collections
    }

    /// Iterate over collection names in declaration order
    pub fn collection_names(&self) -> impl Iterator<Item = &'static str> {
        self.collections.iter().map(|c| c.name)
    }

    /// Look up a collection by exact name
    pub fn collection(&self, name: &str) -> Option<&'static CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Check whether a collection is sanctioned
    pub fn contains_collection(&self, name: &str) -> bool {
        self.collection(name).is_some()
    }

    /// Check whether a field path is declared for a collection
    pub fn has_field(&self, collection: &str, path: &str) -> bool {
        self.collection(collection)
            .map(|c| c.has_field(path))
            .unwrap_or(false)
    }
}
