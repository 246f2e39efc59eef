use kotatsu_schema::{Embed, EmbedFooter, EmbedImage, MediaResult};

pub const EMBED_COLOR: u32 = 0x2f3136;

/// Rich summary for a single match.
pub fn render_media(media: &MediaResult) -> Embed {
    let description = if media.genres.is_empty() {
        media.description.clone()
    } else {
        format!("***{}***\n{}", media.genres.join(", "), media.description)
    };

    let footer: Vec<String> = media
        .format
        .iter()
        .map(|f| f.replace('_', " "))
        .chain(media.release_date.map(|d| d.to_string()))
        .collect();

    Embed {
        title: Some(media.title.clone()),
        description: Some(description.trim_end().to_string()).filter(|d| !d.is_empty()),
        url: Some(media.site_url.clone()),
        color: Some(EMBED_COLOR),
        image: media
            .cover_image_url
            .as_ref()
            .map(|url| EmbedImage { url: url.clone() }),
        footer: (!footer.is_empty()).then(|| EmbedFooter {
            text: footer.join(" · "),
        }),
    }
}

/// Compact title + link list, one line per match. `None` when nothing matched.
pub fn render_media_list(matches: &[MediaResult]) -> Option<Embed> {
    if matches.is_empty() {
        return None;
    }
    let lines: Vec<String> = matches
        .iter()
        .map(|m| format!("[**{}**]({})", m.title, m.site_url))
        .collect();
    Some(Embed {
        description: Some(lines.join("\n")),
        color: Some(EMBED_COLOR),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use kotatsu_schema::ReleaseDate;

    use super::*;

    fn media(title: &str, id: i64) -> MediaResult {
        MediaResult {
            catalog_id: id,
            title: title.into(),
            description: "A story.".into(),
            genres: vec!["Action".into(), "Drama".into()],
            cover_image_url: Some(format!("https://img.example/{id}.jpg")),
            site_url: format!("https://anilist.co/anime/{id}"),
            format: Some("TV_SHORT".into()),
            release_date: Some(ReleaseDate {
                year: 2013,
                month: Some(4),
                day: Some(7),
            }),
        }
    }

    #[test]
    fn single_match_renders_rich_summary() {
        let embed = render_media(&media("Attack on Titan", 16498));
        assert_eq!(embed.title.as_deref(), Some("Attack on Titan"));
        assert_eq!(embed.url.as_deref(), Some("https://anilist.co/anime/16498"));
        assert_eq!(
            embed.description.as_deref(),
            Some("***Action, Drama***\nA story.")
        );
        assert_eq!(
            embed.image.map(|i| i.url).as_deref(),
            Some("https://img.example/16498.jpg")
        );
        assert_eq!(embed.color, Some(EMBED_COLOR));
        assert_eq!(
            embed.footer.map(|f| f.text).as_deref(),
            Some("TV SHORT · 2013-04-07")
        );
    }

    #[test]
    fn sparse_match_omits_optional_parts() {
        let mut m = media("Blame!", 1);
        m.genres.clear();
        m.description.clear();
        m.cover_image_url = None;
        m.format = None;
        m.release_date = None;
        let embed = render_media(&m);
        assert!(embed.description.is_none());
        assert!(embed.image.is_none());
        assert!(embed.footer.is_none());
    }

    #[test]
    fn list_renders_one_line_per_match() {
        let embed = render_media_list(&[media("Naruto", 20), media("Bleach", 269)]).unwrap();
        assert_eq!(
            embed.description.as_deref(),
            Some("[**Naruto**](https://anilist.co/anime/20)\n[**Bleach**](https://anilist.co/anime/269)")
        );
        assert!(embed.title.is_none());
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert!(render_media_list(&[]).is_none());
    }
}
