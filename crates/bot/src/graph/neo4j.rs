//! Neo4j-backed graph store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{Graph, Query, Row, query};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use perfume_bot_core::{CartLine, CatalogEntry, NoteKind, Product, UserId};

use super::{
    CartStore, CartUpdate, CatalogWriter, GraphError, GraphStore, HistoryStore, ProductFilter,
    ProductStore, SEARCH_LIMIT, TitleMatch,
};

const SCHEMA_STATEMENTS: [&str; 3] = [
    "CREATE CONSTRAINT user_id_unique IF NOT EXISTS FOR (u:User) REQUIRE u.user_id IS UNIQUE",
    "CREATE INDEX product_title IF NOT EXISTS FOR (p:Product) ON (p.title)",
    "CREATE INDEX status_name IF NOT EXISTS FOR (s:Status) ON (s.name)",
];

const ADD_TO_CART: &str = "\
    MERGE (u:User {user_id: $user_id}) \
    WITH u \
    MATCH (p:Product {title: $title}) \
    WITH u, p LIMIT 1 \
    MERGE (u)-[r:ADDED_TO_CART]->(p) \
    ON CREATE SET r.timestamp = datetime(), r.quantity = 1 \
    ON MATCH SET r.timestamp = datetime(), r.quantity = r.quantity + 1 \
    RETURN r.quantity AS quantity";

const CLEAR_CART: &str = "\
    MATCH (:User {user_id: $user_id})-[r:ADDED_TO_CART]->(:Product) \
    DELETE r \
    RETURN count(*) AS removed";

const GET_CART: &str = "\
    MATCH (:User {user_id: $user_id})-[r:ADDED_TO_CART]->(p:Product) \
    RETURN p.title AS title, p.price AS price, p.image_url AS image_url, \
           r.quantity AS quantity, toString(r.timestamp) AS added_at \
    ORDER BY r.timestamp DESC";

const RECORD_TURN: &str = "\
    MERGE (u:User {user_id: $user_id}) \
    CREATE (um:UserMessage {id: $user_message_id, message: $user_message, timestamp: datetime()}) \
    CREATE (bm:BotMessage {id: $bot_message_id, message: $bot_message, timestamp: datetime()}) \
    CREATE (u)-[:SENT]->(um) \
    CREATE (bm)-[:REPLIED_WITH]->(u) \
    CREATE (bm)-[:IN_REPLY_TO]->(um)";

const PRODUCT_TITLES: &str = "MATCH (p:Product) RETURN p.title AS title";

/// Graph store backed by a Neo4j database.
///
/// Every statement is bounded by the configured timeout.
#[derive(Clone)]
pub struct Neo4jGraph {
    graph: Graph,
    timeout: Duration,
}

impl std::fmt::Debug for Neo4jGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraph")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Neo4jGraph {
    /// Connect and verify the connection.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Connection` if the database cannot be reached.
    #[instrument(skip(password))]
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &SecretString,
        timeout: Duration,
    ) -> Result<Self, GraphError> {
        info!("Connecting to Neo4j");

        let graph = tokio::time::timeout(
            timeout,
            Graph::new(uri, user, password.expose_secret()),
        )
        .await
        .map_err(|_| GraphError::Timeout(timeout))?
        .map_err(|e| GraphError::Connection(e.to_string()))?;

        let store = Self { graph, timeout };
        store.ping().await?;
        info!("Neo4j connection established");

        Ok(store)
    }

    /// Create constraints and indexes. Failures are logged, not returned.
    pub async fn init_schema(&self) {
        for statement in SCHEMA_STATEMENTS {
            if let Err(e) = self.run(query(statement)).await {
                warn!(statement, error = %e, "Failed to create schema element");
            }
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, GraphError>
    where
        F: Future<Output = Result<T, GraphError>> + Send,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| GraphError::Timeout(self.timeout))?
    }

    async fn run(&self, q: Query) -> Result<(), GraphError> {
        self.bounded(async { Ok(self.graph.run(q).await?) }).await
    }

    async fn fetch(&self, q: Query) -> Result<Vec<Row>, GraphError> {
        self.bounded(async {
            let mut stream = self.graph.execute(q).await?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await? {
                rows.push(row);
            }
            Ok(rows)
        })
        .await
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

fn text(row: &Row, column: &str) -> String {
    row.get::<Option<String>>(column)
        .ok()
        .flatten()
        .unwrap_or_default()
}

fn product_from_row(row: &Row) -> Result<Product, GraphError> {
    let title: String = row
        .get("title")
        .map_err(|e| GraphError::Decode(format!("product title: {e}")))?;

    Ok(Product {
        title,
        price: text(row, "price"),
        size: text(row, "size"),
        image_url: text(row, "image_url"),
        review: row.get::<Option<String>>("review").ok().flatten(),
        stock: text(row, "stock"),
    })
}

fn quantity_from_row(row: &Row) -> Result<u32, GraphError> {
    let quantity: i64 = row
        .get("quantity")
        .map_err(|e| GraphError::Decode(format!("cart quantity: {e}")))?;
    u32::try_from(quantity)
        .map_err(|_| GraphError::Decode(format!("cart quantity out of range: {quantity}")))
}

fn cart_line_from_row(row: &Row) -> Result<CartLine, GraphError> {
    let title: String = row
        .get("title")
        .map_err(|e| GraphError::Decode(format!("cart title: {e}")))?;

    let added_at = row
        .get::<Option<String>>("added_at")
        .ok()
        .flatten()
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|at| at.with_timezone(&Utc));

    Ok(CartLine {
        title,
        price: text(row, "price"),
        image_url: text(row, "image_url"),
        quantity: quantity_from_row(row)?,
        added_at,
    })
}

fn import_statement(entry: &CatalogEntry) -> Query {
    let mut cypher = String::from(
        "CREATE (p:Product {title: $title, size: $size, price: $price, \
         image_url: $image_url, review: $review, stock: $stock}) ",
    );
    if !entry.status.trim().is_empty() {
        cypher.push_str("MERGE (s:Status {name: $status}) CREATE (p)-[:HAS_STATUS]->(s) ");
    }
    for kind in NoteKind::ALL {
        cypher.push_str(&format!(
            "CREATE (p)-[:{}]->(:Note {{type: '{}', description: ${}}}) ",
            kind.relationship(),
            kind.label(),
            note_param(kind)
        ));
    }

    query(cypher.trim_end())
        .param("title", entry.title.clone())
        .param("size", entry.size.clone())
        .param("price", entry.price.clone())
        .param("image_url", entry.image_url.clone())
        .param("review", entry.review.clone())
        .param("stock", entry.stock.clone())
        .param("status", entry.status.trim().to_string())
        .param("top_note", entry.top_note.clone())
        .param("heart_note", entry.heart_note.clone())
        .param("base_note", entry.base_note.clone())
}

const fn note_param(kind: NoteKind) -> &'static str {
    match kind {
        NoteKind::Top => "top_note",
        NoteKind::Heart => "heart_note",
        NoteKind::Base => "base_note",
    }
}

fn search_query(filter: ProductFilter) -> Query {
    let q = query(&filter.cypher()).param("limit", SEARCH_LIMIT);
    match filter {
        ProductFilter::Status(status) => q.param("status", status.as_str()),
        ProductFilter::Title(words) => q
            .param(
                "english",
                words.english.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .param(
                "thai",
                words.thai.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ),
        ProductFilter::Any | ProductFilter::WellReviewed | ProductFilter::MostReviewed => q,
    }
}

// =============================================================================
// Store Implementations
// =============================================================================

#[async_trait]
impl ProductStore for Neo4jGraph {
    #[instrument(skip(self), fields(filter = filter.label()))]
    async fn search(&self, filter: ProductFilter) -> Result<Vec<Product>, GraphError> {
        self.fetch(search_query(filter))
            .await?
            .iter()
            .map(product_from_row)
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_by_title(
        &self,
        title: &str,
        mode: TitleMatch,
    ) -> Result<Option<Product>, GraphError> {
        let rows = self
            .fetch(query(&mode.cypher()).param("title", title))
            .await?;
        rows.first().map(product_from_row).transpose()
    }

    async fn product_titles(&self) -> Result<Vec<String>, GraphError> {
        self.fetch(query(PRODUCT_TITLES))
            .await?
            .iter()
            .map(|row| {
                row.get::<String>("title")
                    .map_err(|e| GraphError::Decode(format!("product title: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl CartStore for Neo4jGraph {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn add_to_cart(&self, user: &UserId, title: &str) -> Result<CartUpdate, GraphError> {
        let rows = self
            .fetch(
                query(ADD_TO_CART)
                    .param("user_id", user.as_str())
                    .param("title", title),
            )
            .await?;

        match rows.first() {
            Some(row) => Ok(CartUpdate::Added {
                quantity: quantity_from_row(row)?,
            }),
            None => Ok(CartUpdate::ProductMissing),
        }
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn clear_cart(&self, user: &UserId) -> Result<u64, GraphError> {
        let rows = self
            .fetch(query(CLEAR_CART).param("user_id", user.as_str()))
            .await?;
        let removed = rows
            .first()
            .and_then(|row| row.get::<i64>("removed").ok())
            .unwrap_or(0);
        Ok(u64::try_from(removed).unwrap_or(0))
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn cart(&self, user: &UserId) -> Result<Vec<CartLine>, GraphError> {
        self.fetch(query(GET_CART).param("user_id", user.as_str()))
            .await?
            .iter()
            .map(cart_line_from_row)
            .collect()
    }
}

#[async_trait]
impl HistoryStore for Neo4jGraph {
    #[instrument(skip(self, user_message, bot_message), fields(user_id = %user))]
    async fn record_turn(
        &self,
        user: &UserId,
        user_message: &str,
        bot_message: &str,
    ) -> Result<(), GraphError> {
        self.run(
            query(RECORD_TURN)
                .param("user_id", user.as_str())
                .param("user_message_id", Uuid::new_v4().to_string())
                .param("user_message", user_message)
                .param("bot_message_id", Uuid::new_v4().to_string())
                .param("bot_message", bot_message),
        )
        .await
    }
}

#[async_trait]
impl CatalogWriter for Neo4jGraph {
    #[instrument(skip(self, entry), fields(title = %entry.title))]
    async fn import_product(&self, entry: &CatalogEntry) -> Result<(), GraphError> {
        self.run(import_statement(entry)).await
    }
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    async fn ping(&self) -> Result<(), GraphError> {
        self.run(query("RETURN 1")).await
    }
}
