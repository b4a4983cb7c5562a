use std::sync::Arc;

use async_trait::async_trait;
use palisade_core::{
    AuthError, Authenticatable, CredentialValue, Credentials, Hasher, UserProvider,
    UserProviderError, UserRef,
};
use palisade_guards::ProviderFactory;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

/// Table and column layout for a provider backed by a PostgreSQL table.
///
/// Identifier and remember columns are cast to text in queries so the layout
/// works with integer and uuid keys alike.
#[derive(Debug, Clone, Deserialize)]
pub struct Columns {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_password_column")]
    pub password_column: String,
    #[serde(default = "default_remember_column")]
    pub remember_column: Option<String>,
}

fn default_table() -> String {
    "users".to_owned()
}

fn default_id_column() -> String {
    "id".to_owned()
}

fn default_password_column() -> String {
    "password".to_owned()
}

fn default_remember_column() -> Option<String> {
    Some("remember_token".to_owned())
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            table: default_table(),
            id_column: default_id_column(),
            password_column: default_password_column(),
            remember_column: default_remember_column(),
        }
    }
}

/// Identifiers come from configuration, not from request input, but they are
/// still interpolated into SQL and therefore restricted to a safe alphabet.
fn safe_identifier(name: &str) -> Result<&str, UserProviderError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(UserProviderError::Backend(format!(
            "unsafe SQL identifier [{name}]"
        )))
    }
}

fn select_clause(columns: &Columns) -> Result<String, UserProviderError> {
    let table = safe_identifier(&columns.table)?;
    let id = safe_identifier(&columns.id_column)?;
    let password = safe_identifier(&columns.password_column)?;
    let remember = match &columns.remember_column {
        Some(column) => format!("{}::text AS remember_token", safe_identifier(column)?),
        None => "NULL::text AS remember_token".to_owned(),
    };

    Ok(format!(
        "SELECT {id}::text AS id, {password} AS password_hash, {remember} FROM {table}"
    ))
}

/// Build the lookup query for a set of credentials. Scalar and set-membership
/// constraints become bound WHERE clauses; predicate constraints cannot be
/// pushed into SQL and are applied to the fetched rows instead, so their
/// presence also drops the LIMIT.
fn build_lookup(
    columns: &Columns,
    credentials: &Credentials,
) -> Result<QueryBuilder<'static, Postgres>, UserProviderError> {
    let mut builder = QueryBuilder::new(select_clause(columns)?);

    let mut predicates = 0usize;
    let mut first = true;
    for (key, value) in credentials.lookup_entries() {
        if matches!(value, CredentialValue::Matches(_)) {
            predicates += 1;
            continue;
        }

        let column = safe_identifier(key)?;
        builder.push(if first { " WHERE " } else { " AND " });
        first = false;

        match value {
            CredentialValue::Value(secret) => {
                builder.push(format!("{column}::text = "));
                builder.push_bind(secret.expose_secret().clone());
            }
            CredentialValue::OneOf(values) => {
                builder.push(format!("{column}::text = ANY("));
                builder.push_bind(values.clone());
                builder.push(")");
            }
            CredentialValue::Matches(_) => unreachable!(),
        }
    }

    if predicates == 0 {
        builder.push(" LIMIT 1");
    }

    Ok(builder)
}

/// One row fetched from the configured table.
struct SqlUser {
    id_column: String,
    identifier: String,
    password_hash: Secret<String>,
    remember_token: Option<Secret<String>>,
}

impl Authenticatable for SqlUser {
    fn auth_identifier_name(&self) -> &str {
        &self.id_column
    }

    fn auth_identifier(&self) -> String {
        self.identifier.clone()
    }

    fn auth_password(&self) -> Secret<String> {
        self.password_hash.clone()
    }

    fn remember_token(&self) -> Option<Secret<String>> {
        self.remember_token.clone()
    }
}

/// User provider backed by a PostgreSQL table through sqlx.
pub struct SqlxUserProvider {
    pool: PgPool,
    hasher: Arc<dyn Hasher>,
    columns: Columns,
}

impl SqlxUserProvider {
    pub fn new(pool: PgPool, hasher: Arc<dyn Hasher>, columns: Columns) -> Self {
        Self {
            pool,
            hasher,
            columns,
        }
    }

    fn user_from_row(&self, row: &PgRow) -> Result<SqlUser, UserProviderError> {
        let identifier: String = row
            .try_get("id")
            .map_err(|e| UserProviderError::Backend(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| UserProviderError::Backend(e.to_string()))?;
        let remember_token: Option<String> = row
            .try_get("remember_token")
            .map_err(|e| UserProviderError::Backend(e.to_string()))?;

        Ok(SqlUser {
            id_column: self.columns.id_column.clone(),
            identifier,
            password_hash: Secret::new(password_hash),
            remember_token: remember_token.map(Secret::new),
        })
    }
}

#[async_trait]
impl UserProvider for SqlxUserProvider {
    #[tracing::instrument(name = "Retrieving user by id from PostgreSQL", skip_all)]
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<UserRef>, UserProviderError> {
        let mut builder = QueryBuilder::<Postgres>::new(select_clause(&self.columns)?);
        builder.push(format!(
            " WHERE {}::text = ",
            safe_identifier(&self.columns.id_column)?
        ));
        builder.push_bind(identifier.to_owned());
        builder.push(" LIMIT 1");

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserProviderError::Backend(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Arc::new(self.user_from_row(&row)?) as UserRef)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "Looking up user by credentials in PostgreSQL", skip_all)]
    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<UserRef>, UserProviderError> {
        if credentials.is_password_only() {
            return Ok(None);
        }

        let predicates: Vec<_> = credentials
            .lookup_entries()
            .filter_map(|(_, value)| match value {
                CredentialValue::Matches(predicate) => Some(Arc::clone(predicate)),
                _ => None,
            })
            .collect();

        let mut builder = build_lookup(&self.columns, credentials)?;
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserProviderError::Backend(e.to_string()))?;

        for row in &rows {
            let user = self.user_from_row(row)?;
            if predicates.iter().all(|predicate| predicate(&user)) {
                return Ok(Some(Arc::new(user) as UserRef));
            }
        }

        Ok(None)
    }

    #[tracing::instrument(name = "Validating user credentials", skip_all)]
    async fn validate_credentials(
        &self,
        user: &dyn Authenticatable,
        credentials: &Credentials,
    ) -> Result<bool, UserProviderError> {
        let Some(plain) = credentials.password_value() else {
            return Ok(false);
        };
        self.hasher
            .check(plain, &user.auth_password())
            .await
            .map_err(|e| UserProviderError::Hash(e.to_string()))
    }
}

/// Provider factory for the `database` provider driver. Every provider built
/// by it shares the pool and hasher; table layout comes from the provider's
/// configured options.
pub fn sqlx_provider_factory(pool: PgPool, hasher: Arc<dyn Hasher>) -> ProviderFactory {
    Arc::new(move |name, config| {
        let columns: Columns = config
            .options()
            .map_err(|e| AuthError::InvalidProviderOptions {
                provider: name.to_owned(),
                message: e.to_string(),
            })?;

        Ok(Arc::new(SqlxUserProvider::new(
            pool.clone(),
            Arc::clone(&hasher),
            columns,
        )) as Arc<dyn UserProvider>)
    })
}
