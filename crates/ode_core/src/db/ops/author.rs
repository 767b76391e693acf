//! Author and token persistence

use uuid::Uuid;

use super::{check_write, next_id, total};
use crate::author::{Author, AuthorStore, NewAuthor, Token, generate_token_key};
use crate::db::models::{CountRow, DbAuthor, DbToken, convert_all};
use crate::db::schema::TOKEN_TABLE;
use crate::db::{DatabaseError, Db, Result};
use crate::id::{AuthorId, AuthorIdType, IdType};
use crate::pagination::{Page, PageRequest};

impl AuthorStore for Db {
    async fn create_author(&self, author: NewAuthor) -> Result<(Author, Token)> {
        let id = next_id(self, AuthorIdType::PREFIX).await?;
        let key = generate_token_key();

        // The token is issued in the same transaction as the author row
        let sql = format!(
            r#"
            BEGIN TRANSACTION;
            CREATE type::thing('{a}', $id) SET
                username = $username,
                first_name = $first_name,
                last_name = $last_name,
                email = $email,
                password_hash = $password_hash,
                is_staff = $is_staff,
                bio = $bio,
                authenticated = false,
                secret_key = $secret_key,
                date_joined = time::now();
            CREATE {t} SET key = $key, author = type::thing('{a}', $id), created = time::now();
            COMMIT TRANSACTION;
            "#,
            a = AuthorIdType::PREFIX,
            t = TOKEN_TABLE,
        );

        let response = self
            .query(sql)
            .bind(("id", id))
            .bind(("username", author.username.clone()))
            .bind(("first_name", author.first_name))
            .bind(("last_name", author.last_name))
            .bind(("email", author.email))
            .bind(("password_hash", author.password_hash))
            .bind(("is_staff", author.is_staff))
            .bind(("bio", author.bio))
            .bind(("secret_key", Uuid::new_v4().to_string()))
            .bind(("key", key))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        check_write(response, format!("author {}", author.username))?;

        let id = AuthorId::new(id);
        let created = self.get_author(id).await?.ok_or_else(|| DatabaseError::NotFound {
            entity: format!("{:?}", id),
        })?;
        let token = self
            .token_for_author(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: format!("token for {:?}", id),
            })?;

        Ok((created, token))
    }

    async fn get_author(&self, id: AuthorId) -> Result<Option<Author>> {
        let rows: Vec<DbAuthor> = self
            .query(format!(
                "SELECT * FROM type::thing('{}', $id)",
                AuthorIdType::PREFIX
            ))
            .bind(("id", id.value()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter().next().map(Author::try_from).transpose()
    }

    async fn get_author_by_username(&self, username: &str) -> Result<Option<Author>> {
        let rows: Vec<DbAuthor> = self
            .query(format!(
                "SELECT * FROM {} WHERE username = $username LIMIT 1",
                AuthorIdType::PREFIX
            ))
            .bind(("username", username.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter().next().map(Author::try_from).transpose()
    }

    async fn get_author_by_secret_key(&self, secret_key: Uuid) -> Result<Option<Author>> {
        let rows: Vec<DbAuthor> = self
            .query(format!(
                "SELECT * FROM {} WHERE secret_key = $secret_key LIMIT 1",
                AuthorIdType::PREFIX
            ))
            .bind(("secret_key", secret_key.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter().next().map(Author::try_from).transpose()
    }

    async fn author_for_token(&self, key: &str) -> Result<Option<Author>> {
        let tokens: Vec<DbToken> = self
            .query(format!("SELECT * FROM {} WHERE key = $key LIMIT 1", TOKEN_TABLE))
            .bind(("key", key.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        match tokens.into_iter().next() {
            Some(token) => {
                let token = Token::try_from(token)?;
                self.get_author(token.author_id).await
            }
            None => Ok(None),
        }
    }

    async fn token_for_author(&self, id: AuthorId) -> Result<Option<Token>> {
        let tokens: Vec<DbToken> = self
            .query(format!(
                "SELECT * FROM {} WHERE author = type::thing('{}', $id) LIMIT 1",
                TOKEN_TABLE,
                AuthorIdType::PREFIX
            ))
            .bind(("id", id.value()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        tokens.into_iter().next().map(Token::try_from).transpose()
    }

    async fn promote_author(&self, id: AuthorId) -> Result<Author> {
        let rows: Vec<DbAuthor> = self
            .query(format!(
                "UPDATE type::thing('{}', $id) SET authenticated = true RETURN AFTER",
                AuthorIdType::PREFIX
            ))
            .bind(("id", id.value()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        rows.into_iter()
            .next()
            .map(Author::try_from)
            .transpose()?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: format!("{:?}", id),
            })
    }

    async fn list_authors(&self, page: PageRequest, oldest_first: bool) -> Result<Page<Author>> {
        let order = if oldest_first { "id ASC" } else { "id DESC" };
        let mut response = self
            .query(format!(
                "SELECT count() AS total FROM {t} GROUP ALL;
                 SELECT * FROM {t} ORDER BY {order} LIMIT $limit START $start;",
                t = AuthorIdType::PREFIX,
            ))
            .bind(("limit", page.size()))
            .bind(("start", page.offset()))
            .await
            .map_err(DatabaseError::QueryFailed)?;

        let counts: Vec<CountRow> = response.take(0).map_err(DatabaseError::QueryFailed)?;
        let rows: Vec<DbAuthor> = response.take(1).map_err(DatabaseError::QueryFailed)?;

        Ok(Page::new(total(counts), convert_all(rows)?))
    }
}
