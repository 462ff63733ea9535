//! End-to-end tests on synthetic sketches

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;
use netsketch::netlist::NETLIST_HEADER;
use netsketch::prelude::*;
use netsketch::{extract_netlist, solver_input};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Two vertical components joined at the top and the bottom by wires.
fn two_component_loop() -> (RgbImage, Vec<RawDetection>) {
    let mut img = RgbImage::from_pixel(400, 240, WHITE);

    // Component bodies (erased by masking).
    draw_hollow_rect_mut(&mut img, PixelRect::at(45, 95).of_size(30, 50), BLACK);
    draw_hollow_rect_mut(&mut img, PixelRect::at(325, 95).of_size(30, 50), BLACK);

    // Top wire with legs down to both boxes.
    draw_filled_rect_mut(&mut img, PixelRect::at(58, 30).of_size(285, 3), BLACK);
    draw_filled_rect_mut(&mut img, PixelRect::at(58, 30).of_size(3, 60), BLACK);
    draw_filled_rect_mut(&mut img, PixelRect::at(338, 30).of_size(3, 60), BLACK);

    // Bottom wire with legs up to both boxes.
    draw_filled_rect_mut(&mut img, PixelRect::at(58, 208).of_size(285, 3), BLACK);
    draw_filled_rect_mut(&mut img, PixelRect::at(58, 151).of_size(3, 60), BLACK);
    draw_filled_rect_mut(&mut img, PixelRect::at(338, 151).of_size(3, 60), BLACK);

    let detections = vec![
        RawDetection::new("resistor", Rect::new(40.0, 90.0, 80.0, 150.0)),
        RawDetection::new("resistor", Rect::new(320.0, 90.0, 360.0, 150.0)),
    ];
    (img, detections)
}

fn run(image: &RgbImage, detections: Vec<RawDetection>, ocr: &[RawText]) -> PipelineOutput {
    NetSketchCore::process(
        image,
        detections,
        ocr,
        &PipelineOptions::default(),
        &RenderConfig::default(),
    )
}

#[test]
fn test_two_components_share_two_nodes() {
    let (img, detections) = two_component_loop();
    let output = run(&img, detections, &[]);

    let lines: Vec<&str> = output.netlist_text.lines().collect();
    assert_eq!(lines.len(), 3, "header plus one line per component");
    assert_eq!(lines[0], NETLIST_HEADER);
    assert_eq!(lines[1], "R1 1 0 1k");
    assert_eq!(lines[2], "R2 1 0 1k");

    assert_eq!(output.node_map.len(), 2);
    assert_eq!(output.nodes.len(), 2);
    assert_eq!(output.components[0].raw_nodes, output.components[1].raw_nodes);
}

#[test]
fn test_ground_is_largest_active_label() {
    let (img, detections) = two_component_loop();
    let output = run(&img, detections, &[]);

    let grounds: Vec<u32> = output
        .node_map
        .iter()
        .filter(|(_, name)| *name == "0")
        .map(|(id, _)| id)
        .collect();
    assert_eq!(grounds.len(), 1);

    let max_active = output.node_map.iter().map(|(id, _)| id).max().unwrap();
    assert_eq!(grounds[0], max_active);
    assert!(!output.node_map.contains(0), "background never named");
}

#[test]
fn test_empty_inputs_give_header_only_and_untouched_images() {
    let mut img = RgbImage::from_pixel(120, 80, WHITE);
    draw_filled_rect_mut(&mut img, PixelRect::at(10, 40).of_size(100, 3), BLACK);

    let (masked, annotated, netlist) = extract_netlist(&img, vec![], &[]);
    assert_eq!(netlist, format!("{}\n", NETLIST_HEADER));
    assert_eq!(masked, img);
    assert_eq!(annotated, img);
    assert_eq!(solver_input(&netlist), "");
}

#[test]
fn test_unit_compatible_text_wins_in_pipeline() {
    let (img, detections) = two_component_loop();
    // Left component center is (60, 120).
    let ocr = vec![
        RawText::new("5V", Rect::new(80.0, 110.0, 100.0, 130.0), 0.9),
        RawText::new("10k", Rect::new(100.0, 110.0, 120.0, 130.0), 0.9),
    ];
    let output = run(&img, detections, &ocr);

    assert_eq!(output.components[0].matched_value.as_deref(), Some("10K"));
    assert!(output.netlist_text.contains("R1 1 0 10K"));
}

#[test]
fn test_no_text_in_range_uses_placeholder() {
    let (img, detections) = two_component_loop();
    let ocr = vec![RawText::new("47k", Rect::new(380.0, 0.0, 399.0, 10.0), 0.9)];
    let output = run(&img, detections, &ocr);

    // Left component is ~349 px away from the fragment.
    assert!(output.components[0].matched_value.is_none());
    assert!(output.netlist_text.contains("R1 1 0 1k"));
    assert!(!output.netlist.entries[0].value_matched);
}

#[test]
fn test_micro_symbol_fused_and_not_a_component() {
    let (img, mut detections) = two_component_loop();
    detections[0].label = "capacitor".to_string();
    detections.push(RawDetection::new("micro", Rect::new(115.0, 110.0, 125.0, 120.0)));
    let ocr = vec![RawText::new("10", Rect::new(70.0, 105.0, 90.0, 125.0), 0.9)];

    let output = run(&img, detections, &ocr);

    assert_eq!(output.stats.symbols, 1);
    assert_eq!(output.stats.components, 2);
    assert_eq!(output.stats.fused_texts, 1);
    assert_eq!(output.texts[0].text, "10u");
    assert!(output.netlist_text.contains("C1 1 0 10U"));
    assert!(output.netlist_text.contains("R1 1 0"));
}

#[test]
fn test_isolated_component_has_unknown_terminal() {
    let mut img = RgbImage::from_pixel(200, 200, WHITE);
    // A speck next to the box: too small to be a node even after dilation.
    img.put_pixel(85, 100, BLACK);
    let detections = vec![RawDetection::new("inductor", Rect::new(40.0, 80.0, 80.0, 120.0))];

    let output = run(&img, detections, &[]);
    assert!(output.components[0].raw_nodes.is_empty());
    assert!(output.node_map.is_empty());
    assert_eq!(output.netlist.entries[0].to_line(), "L1 ? 0 1k");
}

#[test]
fn test_single_node_defaults_second_terminal_to_ground() {
    let mut img = RgbImage::from_pixel(300, 120, WHITE);
    draw_filled_rect_mut(&mut img, PixelRect::at(80, 58).of_size(150, 3), BLACK);
    let detections = vec![RawDetection::new("battery", Rect::new(40.0, 40.0, 80.0, 80.0))];

    let output = run(&img, detections, &[]);
    assert_eq!(output.components[0].raw_nodes.len(), 1);
    assert_eq!(output.netlist.entries[0].to_line(), "V1 0 0 1k");
}

#[test]
fn test_text_regions_are_erased_from_mask() {
    let mut img = RgbImage::from_pixel(100, 100, WHITE);
    draw_filled_rect_mut(&mut img, PixelRect::at(40, 40).of_size(20, 20), BLACK);
    let ocr = vec![RawText::new(
        "R1",
        Shape::polygon(&[(35.0, 35.0), (65.0, 35.0), (65.0, 65.0), (35.0, 65.0)]),
        0.8,
    )];

    let output = run(&img, vec![], &ocr);
    assert_eq!(*output.masked.get_pixel(50, 50), WHITE);
    assert_eq!(output.stats.wire_regions, 0);
}

#[test]
fn test_annotated_image_marks_components() {
    let (img, detections) = two_component_loop();
    let output = run(&img, detections, &[]);

    assert_eq!(output.annotated.dimensions(), img.dimensions());
    assert_eq!(output.masked.dimensions(), img.dimensions());
    // Box outline color on the component edge.
    assert_eq!(*output.annotated.get_pixel(60, 90), Rgb([0, 255, 0]));
    assert_ne!(output.annotated, img);
}

#[test]
fn test_min_confidence_filters_ocr() {
    let (img, detections) = two_component_loop();
    let ocr = vec![RawText::new("10k", Rect::new(100.0, 110.0, 120.0, 130.0), 0.3)];
    let options = PipelineOptions {
        min_text_confidence: 0.5,
        ..PipelineOptions::default()
    };
    let output = NetSketchCore::process(&img, detections, &ocr, &options, &RenderConfig::default());
    assert!(output.texts.is_empty());
    assert!(output.components[0].matched_value.is_none());
}

#[test]
fn test_runs_independently_on_threads() {
    let (img, detections) = two_component_loop();
    let expected = run(&img, detections.clone(), &[]).netlist_text;

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let img = &img;
                let detections = detections.clone();
                s.spawn(move || run(img, detections, &[]).netlist_text)
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_json_output() {
    let (img, detections) = two_component_loop();
    let output = run(&img, detections, &[]);
    let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["stats"]["active_nodes"], 2);
}

#[test]
fn test_huge_boxes_do_not_abort_the_pass() {
    let img = RgbImage::from_pixel(300, 300, WHITE);
    let detections = vec![RawDetection::new("resistor", Rect::new(0.0, 0.0, 3.0e9, 50.0))];
    let ocr = vec![
        RawText::new("wide", Rect::new(-1.0e12, 100.0, 1.0e12, 150.0), 0.9),
        RawText::new(
            "far",
            Shape::polygon(&[(0.0, 200.0), (1.0e12, 200.0), (1.0e12, 250.0)]),
            0.9,
        ),
    ];

    let output = run(&img, detections, &ocr);
    assert_eq!(output.netlist.entries[0].to_line(), "R1 ? 0 1k");
    assert_eq!(output.annotated.dimensions(), img.dimensions());
}

#[test]
fn test_inverted_box_behaves_like_normal_box() {
    let (img, mut detections) = two_component_loop();
    detections[0].bbox = Rect::new(80.0, 150.0, 40.0, 90.0);

    let output = run(&img, detections, &[]);
    assert_eq!(output.netlist.entries[0].to_line(), "R1 1 0 1k");
    assert_eq!(output.netlist.entries[1].to_line(), "R2 1 0 1k");
}

#[test]
fn test_box_outside_image_touches_nothing() {
    let (img, mut detections) = two_component_loop();
    detections.push(RawDetection::new("capacitor", Rect::new(1000.0, 1000.0, 1100.0, 1100.0)));
    let ocr = vec![RawText::new("47u", Rect::new(-500.0, -500.0, -480.0, -490.0), 0.9)];

    let output = run(&img, detections, &ocr);
    assert_eq!(output.netlist.entries[2].to_line(), "C1 ? 0 1k");
    assert_eq!(output.netlist.entries[0].to_line(), "R1 1 0 1k");
}

#[test]
fn test_non_finite_boxes_are_tolerated() {
    let img = RgbImage::from_pixel(200, 200, WHITE);
    let detections = vec![
        RawDetection::new("resistor", Rect::new(0.0, 0.0, f64::INFINITY, 50.0)),
        RawDetection::new("capacitor", Rect::new(f64::NAN, 20.0, 60.0, 60.0)),
    ];
    let ocr = vec![RawText::new("10k", Rect::new(f64::NAN, 0.0, 10.0, 10.0), 0.9)];

    let output = run(&img, detections, &ocr);
    assert_eq!(output.netlist.entries[0].to_line(), "R1 ? 0 1k");
    assert_eq!(output.netlist.entries[1].to_line(), "C1 ? 0 1k");
    assert_eq!(output.masked.dimensions(), img.dimensions());
}

#[test]
fn test_empty_polygon_text_is_not_matched() {
    let img = RgbImage::from_pixel(300, 300, WHITE);
    let detections = vec![RawDetection::new("battery", Rect::new(40.0, 40.0, 80.0, 80.0))];
    let ocr = vec![RawText::new("12V", Shape::Polygon(vec![]), 0.9)];

    let output = run(&img, detections, &ocr);
    assert!(output.components[0].matched_value.is_none());
    assert_eq!(output.netlist.entries[0].to_line(), "V1 ? 0 1k");
    assert_eq!(output.texts.len(), 1, "kept for the report");
}
