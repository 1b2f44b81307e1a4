use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginSide {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    LightGreen,
    LightBlue,
    Black,
    White,
}

/// How a message bubble is drawn. Always derived from [`OriginSide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub alignment: Alignment,
    pub bubble: Color,
    pub foreground: Color,
}

impl OriginSide {
    pub fn presentation(self) -> Presentation {
        match self {
            Self::User => Presentation {
                alignment: Alignment::Right,
                bubble: Color::LightGreen,
                foreground: Color::Black,
            },
            Self::Assistant => Presentation {
                alignment: Alignment::Left,
                bubble: Color::LightBlue,
                foreground: Color::White,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text { content: String, origin: OriginSide },
    Image { bytes: Arc<[u8]>, origin: OriginSide },
}

impl Message {
    pub fn text(origin: OriginSide, content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            origin,
        }
    }

    pub fn image(origin: OriginSide, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Image {
            bytes: bytes.into(),
            origin,
        }
    }

    pub fn origin(&self) -> OriginSide {
        match self {
            Self::Text { origin, .. } | Self::Image { origin, .. } => *origin,
        }
    }

    pub fn presentation(&self) -> Presentation {
        self.origin().presentation()
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content.as_str()),
            Self::Image { .. } => None,
        }
    }

    pub fn image_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Image { bytes, .. } => Some(bytes.as_ref()),
            Self::Text { .. } => None,
        }
    }
}

/// Append-only, insertion-ordered conversation log.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
