mod common;

use common::Document;
use gridformat::{
    CellType, Codec, Compressor, ConfigError, DataFormat, Encoder, Error, FieldData, Grid, ImageGrid, UnstructuredMesh,
    Vti, Vtp, Vtu, Writer, XmlOptions,
};

fn triangles() -> UnstructuredMesh {
    let mut mesh = UnstructuredMesh::new(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    mesh.add_cell(CellType::Triangle, vec![0, 1, 2]).unwrap();
    mesh.add_cell(CellType::Triangle, vec![0, 2, 3]).unwrap();
    mesh
}

fn codec(options: &XmlOptions) -> Codec {
    let compressor = if options.encoder.is_ascii() {
        Compressor::None
    } else {
        options.compressor
    };
    Codec::new(options.encoder, compressor, options.header_precision, options.byte_order)
}

fn write<F>(format: F, mesh: &UnstructuredMesh, options: XmlOptions, fields: usize) -> Vec<u8>
where
    F: gridformat::WritePiece<UnstructuredMesh>,
{
    let mut writer = Writer::new(format, mesh, options).unwrap();
    for k in 0..fields {
        writer.set_point_field(format!("f{}", k), move |p: &usize| (k * 100 + p) as f64);
    }

    let mut out = Vec::new();
    writer.write(&mut out).unwrap();
    out
}

#[test]
fn appended_offsets_are_cumulative() {
    let mesh = triangles();

    for options in [
        XmlOptions::default(),
        XmlOptions::default().with_encoder(Encoder::Base64),
        XmlOptions::default().with_compressor(Compressor::None),
        XmlOptions::default().with_encoder(Encoder::Base64).with_compressor(Compressor::lz4()),
    ] {
        let codec = codec(&options);

        for fields in 0..5 {
            let doc = Document::parse(&write(gridformat::Vtu, &mesh, options, fields));
            let appendix = doc.appendix.as_ref().unwrap();

            // fields, coordinates, connectivity, offsets, types
            let offsets = doc.offsets();
            assert_eq!(offsets.len(), fields + 4);
            assert_eq!(offsets[0], 0);
            assert!(offsets.windows(2).all(|w| w[0] < w[1]));

            let mut expected_offset = 0;
            for k in 0..fields {
                let name = format!("f{}", k);
                let expected = FieldData::Float64((0..4).map(|p| (k * 100 + p) as f64).collect());
                let array = doc.data_array(&name);
                assert_eq!(array.attribute("offset"), Some(expected_offset.to_string().as_str()));
                assert_eq!(doc.decode(&name, &codec), expected);
                expected_offset += codec.encode(&expected).unwrap().len();
            }

            assert_eq!(doc.decode("connectivity", &codec), FieldData::Int64(vec![0, 1, 2, 0, 2, 3]));
            assert_eq!(doc.decode("offsets", &codec), FieldData::Int64(vec![3, 6]));
            assert_eq!(doc.decode("types", &codec), FieldData::UInt8(vec![5, 5]));

            let last = *offsets.last().unwrap();
            let types = codec.encode(&FieldData::UInt8(vec![5, 5])).unwrap();
            assert_eq!(last + types.len(), appendix.len());
        }
    }
}

#[test]
fn appended_section_layout() {
    let out = write(Vtu, &triangles(), XmlOptions::default().with_encoder(Encoder::Base64), 1);
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("<?xml version=\"1.0\"?>"));
    assert!(text.contains("<AppendedData encoding=\"base64\">\n    _"));
    assert!(text.ends_with("\n  </AppendedData>\n</VTKFile>\n"));
    assert!(text.contains("compressor=\"vtkZLibDataCompressor\""));
    assert!(text.contains("header_type=\"UInt64\""));
}

#[test]
fn documents_without_arrays_have_no_appended_section() {
    let grid = ImageGrid::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2, 2, 2]).unwrap();
    let writer = Writer::new(Vti, &grid, XmlOptions::default()).unwrap();

    let mut out = Vec::new();
    writer.write(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(!text.contains("AppendedData"));
    assert!(text.trim_end().ends_with("</VTKFile>"));
    assert!(text.contains("WholeExtent=\"0 2 0 2 0 2\""));
}

#[test]
fn inlined_ascii() {
    let mesh = triangles();
    let doc = Document::parse(&write(Vtu, &mesh, XmlOptions::ascii(), 1));

    assert!(doc.appendix.is_none());
    assert!(doc.first("VTKFile").attribute("compressor").is_none());

    let array = doc.data_array("f0");
    assert_eq!(array.attribute("format"), Some("ascii"));
    assert_eq!(array.text.as_deref(), Some("0.0 1.0 2.0 3.0"));

    let types = doc.data_array("types");
    assert_eq!(types.text.as_deref(), Some("5 5"));
}

#[test]
fn inlined_base64() {
    let mesh = triangles();
    let options = XmlOptions::default()
        .with_encoder(Encoder::Base64)
        .with_data_format(DataFormat::Inlined);
    let doc = Document::parse(&write(Vtu, &mesh, options, 2));

    assert!(doc.appendix.is_none());
    assert_eq!(doc.data_array("f1").attribute("format"), Some("binary"));
    assert_eq!(
        doc.decode("f1", &codec(&options)),
        FieldData::Float64(vec![100.0, 101.0, 102.0, 103.0])
    );
}

#[test]
fn invalid_placement_writes_nothing() {
    let mesh = triangles();

    let raw_inlined = XmlOptions::default().with_data_format(DataFormat::Inlined);
    let ascii_appended = XmlOptions::ascii().with_data_format(DataFormat::Appended);

    for options in [raw_inlined, ascii_appended] {
        match Writer::new(Vtu, &mesh, options) {
            Err(Error::Config(_)) => (),
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }
}

#[test]
fn failed_writes_leave_the_sink_untouched() {
    let mut mesh = triangles();
    mesh.add_cell(CellType::Tetrahedron, vec![0, 1, 2, 3]).unwrap();

    let writer = Writer::new(Vtp, &mesh, XmlOptions::default()).unwrap();
    let mut out = Vec::new();
    assert!(writer.write(&mut out).is_err());
    assert!(out.is_empty());

    let dir = std::env::temp_dir().join(format!("gridformat-failed-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    assert!(writer.write_to_file(dir.join("mesh")).is_err());
    assert!(!dir.join("mesh.vtp").exists());
}

#[test]
fn volume_cells_are_rejected_by_poly_data() {
    let mut mesh = triangles();
    mesh.add_cell(CellType::Tetrahedron, vec![0, 1, 2, 3]).unwrap();

    for options in [XmlOptions::default(), XmlOptions::ascii()] {
        let writer = Writer::new(Vtp, &mesh, options).unwrap();
        let mut out = Vec::new();
        let result = writer.write(&mut out);

        assert!(
            matches!(result, Err(Error::Config(ConfigError::UnsupportedCellType(_)))),
            "{:?}",
            result
        );
        assert!(out.is_empty());
    }
}

/// A triangle whose last corner has an id that none of the points carries
struct Dangling {
    ids: [usize; 3],
}

impl Grid for Dangling {
    type Point = usize;
    type Cell = ();
    type Scalar = f64;
    type Position = [f64; 2];

    fn points(&self) -> impl Iterator<Item = usize> + '_ {
        0..3
    }

    fn cells(&self) -> impl Iterator<Item = ()> + '_ {
        std::iter::once(())
    }

    fn number_of_points(&self) -> usize {
        3
    }

    fn number_of_cells(&self) -> usize {
        1
    }

    fn cell_points(&self, _: &()) -> impl Iterator<Item = usize> + '_ {
        [0, 1, 3].into_iter()
    }

    fn point_coordinates(&self, point: &usize) -> [f64; 2] {
        [*point as f64, 0.0]
    }

    fn point_id(&self, point: &usize) -> usize {
        self.ids.get(*point).copied().unwrap_or(*point)
    }

    fn cell_type(&self, _: &()) -> CellType {
        CellType::Triangle
    }
}

#[test]
fn unknown_points_are_rejected() {
    let grid = Dangling { ids: [0, 1, 2] };
    let values = [1.0f32, 2.0, 3.0];

    for options in [XmlOptions::default(), XmlOptions::ascii()] {
        let mut writer = Writer::new(Vtu, &grid, options).unwrap();
        writer.set_point_values("pressure", &values).unwrap();

        let mut out = Vec::new();
        let result = writer.write(&mut out);
        assert!(
            matches!(result, Err(Error::Config(ConfigError::UnknownPoint(_)))),
            "{:?}",
            result
        );
        assert!(out.is_empty());
    }
}

#[test]
fn point_values_need_an_entry_for_every_id() {
    let grid = Dangling { ids: [0, 1, 5] };
    let values = [1.0f32, 2.0, 3.0];

    let mut writer = Writer::new(Vtu, &grid, XmlOptions::ascii()).unwrap();
    let result = writer.set_point_values("pressure", &values);
    assert!(matches!(result, Err(Error::Config(ConfigError::FieldSize(_)))));
}

#[test]
fn field_size_mismatch() {
    let mesh = triangles();
    let values = [1.0, 2.0, 3.0];
    let mut writer = Writer::new(Vtu, &mesh, XmlOptions::default()).unwrap();

    assert!(writer.set_point_values("short", &values).is_err());
    assert!(writer.set_cell_values("short", &values).is_err());
    assert!(writer.set_cell_values("fits", &values[..2]).is_ok());
}

#[test]
fn meta_data() {
    let mesh = triangles();
    let mut writer = Writer::new(Vtu, &mesh, XmlOptions::ascii()).unwrap();
    writer.set_meta_data("time", 1.5);
    writer.set_meta_data("name", "flow");

    let mut out = Vec::new();
    writer.write(&mut out).unwrap();
    let doc = Document::parse(&out);

    doc.first("FieldData");
    let time = doc.data_array("time");
    assert_eq!(time.attribute("NumberOfTuples"), Some("1"));
    assert_eq!(time.text.as_deref(), Some("1.5"));

    let name = doc.data_array("name");
    assert_eq!(name.attribute("type"), Some("UInt8"));
    assert_eq!(name.attribute("NumberOfTuples"), Some("4"));
}

#[test]
fn poly_data_groups_cells() {
    let mut mesh = UnstructuredMesh::new(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    mesh.add_cell(CellType::Quadrilateral, vec![0, 1, 2, 3]).unwrap();
    mesh.add_cell(CellType::Segment, vec![0, 2]).unwrap();
    mesh.add_cell(CellType::Vertex, vec![3]).unwrap();

    let ids = [0u32, 1, 2];
    let mut writer = Writer::new(Vtp, &mesh, XmlOptions::ascii()).unwrap();
    writer.set_cell_values("id", &ids).unwrap();

    let mut out = Vec::new();
    writer.write(&mut out).unwrap();
    let doc = Document::parse(&out);

    let piece = doc.first("Piece");
    assert_eq!(piece.attribute("NumberOfVerts"), Some("1"));
    assert_eq!(piece.attribute("NumberOfLines"), Some("1"));
    assert_eq!(piece.attribute("NumberOfPolys"), Some("1"));

    // vertices first, then lines, then polygons
    assert_eq!(doc.data_array("id").text.as_deref(), Some("2 1 0"));
    let connectivity: Vec<_> = doc
        .all("DataArray")
        .into_iter()
        .filter(|a| a.attribute("Name") == Some("connectivity"))
        .map(|a| a.text.clone().unwrap_or_default())
        .collect();
    assert_eq!(connectivity, vec!["3", "0 2", "0 1 2 3"]);
}

#[test]
fn output_is_deterministic() {
    let mesh = triangles();
    let options = XmlOptions::default().with_compressor(Compressor::lzma());

    let first = write(Vtu, &mesh, options, 3);
    let second = write(Vtu, &mesh, options, 3);
    assert_eq!(first, second);
}

#[test]
fn field_names_are_escaped() {
    let mesh = triangles();
    let mut writer = Writer::new(Vtu, &mesh, XmlOptions::default()).unwrap();
    writer.set_point_field("a\"b<offset=\"", |p: &usize| *p as f32);

    let mut out = Vec::new();
    writer.write(&mut out).unwrap();
    let doc = Document::parse(&out);

    let codec = codec(&XmlOptions::default());
    assert_eq!(
        doc.decode("a\"b<offset=\"", &codec),
        FieldData::Float32(vec![0.0, 1.0, 2.0, 3.0])
    );
}
