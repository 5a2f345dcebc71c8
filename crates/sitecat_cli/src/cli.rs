use clap::{Parser, Subcommand, ValueEnum};
use sitecat_core::{AreaScope, BagPhotoSource, ContextScope, Hemisphere, Scope, TypeList};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitecat", about = "Archaeological survey catalog", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite catalog file (overrides `db_path` from the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log diagnostics to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert latitude/longitude to UTM
    ToUtm {
        /// Latitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        /// Longitude in decimal degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Project into this zone instead of the natural one
        #[arg(long)]
        zone: Option<u8>,
    },

    /// Convert UTM to latitude/longitude
    ToLatlong {
        /// UTM zone (1-60)
        zone: u8,
        /// Hemisphere, N or S
        hemisphere: Hemisphere,
        /// Easting in meters
        easting: f64,
        /// Northing in meters
        northing: f64,
    },

    /// Register an area, filling its coordinate from the grid origin
    RegisterArea {
        /// Area scope, e.g. N-38-478130-4419430
        area: AreaScope,
        /// Area type label
        #[arg(long = "type", default_value = "")]
        area_type: String,
    },

    /// Create a context, allocating the next number unless one is given
    NewContext {
        /// Area scope, e.g. N-38-478130-4419430
        area: AreaScope,
        /// Use this context number instead of allocating one
        #[arg(long)]
        number: Option<u32>,
        /// Context type label
        #[arg(long = "type", default_value = "")]
        context_type: String,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create a find, allocating the next number unless one is given
    NewFind {
        /// Context scope, e.g. N-38-478130-4419430-12
        context: ContextScope,
        /// Use this find number instead of allocating one
        #[arg(long)]
        number: Option<u32>,
        /// Material, paired with --category
        #[arg(long, requires = "category")]
        material: Option<String>,
        /// Category, paired with --material
        #[arg(long, requires = "material")]
        category: Option<String>,
        /// Director notes
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List find numbers of a context
    Finds {
        /// Context scope, e.g. N-38-478130-4419430-12
        context: ContextScope,
    },

    /// Register the next photo of a context, context bag or find
    PhotoAdd {
        /// Context or find scope
        scope: Scope,
        /// File extension, e.g. jpg
        #[arg(long = "ext", default_value = "jpg")]
        extension: String,
        /// Photo of the context's finds bag, taken in the field or while drying
        #[arg(long, value_enum)]
        bag: Option<BagSourceArg>,
    },

    /// List photos of a context, context bag or find
    Photos {
        /// Context or find scope
        scope: Scope,
        /// List the context's bag photos
        #[arg(long)]
        bag: bool,
    },

    /// Mark a stored photo file as replaced
    PhotoReplace {
        /// Context or find scope
        scope: Scope,
        /// Stored file name, e.g. 3.jpg
        file_name: String,
        /// The file is a bag photo of the context
        #[arg(long)]
        bag: bool,
    },

    /// List or extend the area-type or context-type options
    Types {
        list: TypeListArg,
        /// Add this option before listing
        #[arg(long)]
        add: Option<String>,
    },

    /// Show the action log, newest first
    History {
        /// Record uuid, or area scope text
        object_id: Option<String>,
        /// Show at most this many entries
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BagSourceArg {
    Field,
    Drying,
}

impl From<BagSourceArg> for BagPhotoSource {
    fn from(value: BagSourceArg) -> Self {
        match value {
            BagSourceArg::Field => Self::InField,
            BagSourceArg::Drying => Self::Drying,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TypeListArg {
    Area,
    Context,
}

impl From<TypeListArg> for TypeList {
    fn from(value: TypeListArg) -> Self {
        match value {
            TypeListArg::Area => Self::Area,
            TypeListArg::Context => Self::Context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BagSourceArg, Cli, Commands, TypeListArg};
    use sitecat_core::Scope;
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn to_utm_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["sitecat", "to-utm", "43.642567", "-79.387139"]).unwrap();
        match cli.command {
            Commands::ToUtm {
                latitude,
                longitude,
                zone,
            } => {
                assert_eq!(latitude, 43.642567);
                assert_eq!(longitude, -79.387139);
                assert_eq!(zone, None);
            }
            _ => panic!("expected to-utm"),
        }
    }

    #[test]
    fn scopes_are_parsed_at_the_right_depth() {
        let cli = Cli::try_parse_from([
            "sitecat",
            "--db",
            "/tmp/dig.db",
            "new-find",
            "N-38-478130-4419430-12",
            "--material",
            "ceramic",
            "--category",
            "sherd",
        ])
        .unwrap();
        assert!(cli.db.is_some());
        match cli.command {
            Commands::NewFind {
                context, material, ..
            } => {
                assert_eq!(context.context_number, 12);
                assert_eq!(material.as_deref(), Some("ceramic"));
            }
            _ => panic!("expected new-find"),
        }

        assert!(Cli::try_parse_from(["sitecat", "finds", "N-38-478130-4419430"]).is_err());
        assert!(
            Cli::try_parse_from(["sitecat", "new-find", "N-38-1-1-1", "--material", "x"]).is_err()
        );
    }

    #[test]
    fn photo_commands_take_any_record_scope() {
        let cli = Cli::try_parse_from([
            "sitecat",
            "photo-add",
            "N-38-478130-4419430-12",
            "--ext",
            "png",
            "--bag",
            "drying",
        ])
        .unwrap();
        match cli.command {
            Commands::PhotoAdd {
                scope,
                extension,
                bag,
            } => {
                assert!(matches!(scope, Scope::Context(_)));
                assert_eq!(extension, "png");
                assert_eq!(bag, Some(BagSourceArg::Drying));
            }
            _ => panic!("expected photo-add"),
        }

        let cli = Cli::try_parse_from([
            "sitecat",
            "photo-replace",
            "N-38-478130-4419430-12-3",
            "2.jpg",
        ])
        .unwrap();
        match cli.command {
            Commands::PhotoReplace {
                scope,
                file_name,
                bag,
            } => {
                assert!(matches!(scope, Scope::Find(_)));
                assert_eq!(file_name, "2.jpg");
                assert!(!bag);
            }
            _ => panic!("expected photo-replace"),
        }

        assert!(
            Cli::try_parse_from(["sitecat", "photo-add", "N-38-1-1", "--bag", "wet"]).is_err()
        );
    }

    #[test]
    fn types_and_history_parse() {
        let cli =
            Cli::try_parse_from(["sitecat", "types", "context", "--add", "pit fill"]).unwrap();
        match cli.command {
            Commands::Types { list, add } => {
                assert_eq!(list, TypeListArg::Context);
                assert_eq!(add.as_deref(), Some("pit fill"));
            }
            _ => panic!("expected types"),
        }

        let cli = Cli::try_parse_from(["sitecat", "history"]).unwrap();
        match cli.command {
            Commands::History { object_id, limit } => {
                assert_eq!(object_id, None);
                assert_eq!(limit, 20);
            }
            _ => panic!("expected history"),
        }
    }
}
