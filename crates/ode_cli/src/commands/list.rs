use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use miette::Result;
use ode_core::author::{Author, AuthorStore};
use ode_core::content::{ContentQuery, ContentStore, ListOrder, Post, Series, Tutorial};
use ode_core::db::Db;
use ode_core::pagination::PageRequest;

use crate::ListTarget;
use crate::output::Output;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(*h)));
    table
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "" }
}

pub fn authors_table(authors: &[Author]) -> Table {
    let mut table = table(&[
        "id",
        "username",
        "name",
        "email",
        "staff",
        "authenticated",
        "joined",
    ]);
    for author in authors {
        let name = format!("{} {}", author.first_name, author.last_name);
        table.add_row(vec![
            author.id.value().to_string(),
            author.username.clone(),
            name.trim().to_string(),
            author.email.clone(),
            yes_no(author.is_staff).to_string(),
            yes_no(author.authenticated).to_string(),
            author.date_joined.format(DATE_FORMAT).to_string(),
        ]);
    }
    table
}

pub fn posts_table(posts: &[Post]) -> Table {
    let mut table = table(&["id", "title", "slug", "author", "draft", "created"]);
    for post in posts {
        table.add_row(vec![
            post.id.value().to_string(),
            post.title.clone(),
            post.slug.clone(),
            post.author_username.clone(),
            yes_no(post.draft).to_string(),
            post.timestamp.format(DATE_FORMAT).to_string(),
        ]);
    }
    table
}

pub fn tutorials_table(tutorials: &[Tutorial]) -> Table {
    let mut table = table(&["id", "title", "slug", "series", "#", "author", "draft"]);
    for tutorial in tutorials {
        table.add_row(vec![
            tutorial.id.value().to_string(),
            tutorial.title.clone(),
            tutorial.slug.clone(),
            tutorial.series_name.clone().unwrap_or_default(),
            tutorial.number.to_string(),
            tutorial.author_username.clone(),
            yes_no(tutorial.draft).to_string(),
        ]);
    }
    table
}

pub fn series_table(series: &[Series]) -> Table {
    let mut table = table(&["id", "name", "slug", "type", "creator", "tutorials"]);
    for s in series {
        table.add_row(vec![
            s.id.value().to_string(),
            s.name.clone(),
            s.slug.clone(),
            s.type_of.label().to_string(),
            s.creator_username.clone(),
            s.tutorial_count.to_string(),
        ]);
    }
    table
}

/// Print the first `limit` rows of `what`, by ascending id, drafts included
pub async fn run(db: &Db, what: ListTarget, limit: Option<u32>) -> Result<()> {
    let output = Output::new();
    let page = PageRequest::first(limit.unwrap_or(u32::MAX));
    let everything = ContentQuery::published()
        .with_drafts()
        .ordered(ListOrder::IdAsc);

    let (shown, total, table) = match what {
        ListTarget::Authors => {
            let authors = db.list_authors(page, true).await?;
            (authors.results.len(), authors.count, authors_table(&authors.results))
        }
        ListTarget::Posts => {
            let posts = db.list_posts(&everything, page).await?;
            (posts.results.len(), posts.count, posts_table(&posts.results))
        }
        ListTarget::Tutorials => {
            let tutorials = db.list_tutorials(&everything, page).await?;
            (
                tutorials.results.len(),
                tutorials.count,
                tutorials_table(&tutorials.results),
            )
        }
        ListTarget::Series => {
            let series = db.list_series(&everything, page).await?;
            (series.results.len(), series.count, series_table(&series.results))
        }
    };

    if total == 0 {
        output.status("Nothing stored yet");
        return Ok(());
    }

    println!("{table}");
    output.status(&format!("{} of {} shown", shown, total));
    Ok(())
}
