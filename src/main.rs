use std::path::PathBuf;

use dicom_compare::session::Session;

fn main() {
    let folders: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let session = Session::load(&folders).expect("should have loaded the given folders");

    for index in 0..session.series_count() {
        println!(
            "series {}: {} slices from {}",
            index + 1,
            session.series()[index].len(),
            session.current_folder_name(index),
        );
    }
    println!("global max index: {}", session.global_max_index());

    let png = session
        .png_slice(0, 0)
        .expect("should have rendered the first slice");
    std::fs::write("slice.png", png).expect("should have written slice.png");
}
