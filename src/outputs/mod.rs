//! Files written at the end of each workitem and each run.
//!
//! # Submodules
//!
//! - [`table`]: the CSV report of one workitem's articles
//! - [`json`]: the outcomes of every workitem in the run
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── search_results_0.csv        # report of the first workitem
//! ├── search_results_1.csv
//! ├── image_Ab12Cd34.jpg          # downloaded article images
//! ├── evidence/
//! │   └── failed_page1_item3.png  # screenshots of unparsable results
//! └── workitems_output.json       # one outcome per workitem
//! ```

pub mod json;
pub mod table;
